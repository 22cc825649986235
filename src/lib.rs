pub mod audio;
pub mod directive;
pub mod driver;
pub mod error;
pub mod session;
pub mod speakers;
pub mod tts;

pub use audio::{AudioTool, FfmpegTool, NativeTool};
pub use directive::{Directive, parse_line};
pub use driver::{RunState, RunSummary, ScenarioDriver};
pub use error::{AudioError, DirectiveError, ScenarioError, SynthesisError};
pub use session::{SessionDefaults, SessionState, StereoPosition, SynthesisParameters, Voice};
pub use tts::{Synthesizer, TtsClient};
