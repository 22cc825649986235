use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use voice_scenario::StereoPosition;
use voice_scenario::driver::DEFAULT_SILENCE_ASSET;
use voice_scenario::tts::DEFAULT_SERVER;

/// Build a single narrated audio file from a scenario script.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Base URL of the synthesis server
    #[clap(long, global = true, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Log at debug level (RUST_LOG takes precedence)
    #[clap(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize a scenario script into one audio file
    Generate(GenerateArgs),
    /// Save the server's speaker and style list as JSON
    Speakers {
        #[clap(long, short, default_value = "speakers.json")]
        output: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    #[clap(long, short, default_value = "scenario.txt")]
    pub input: PathBuf,

    #[clap(long, short, default_value = "audio.wav")]
    pub output: PathBuf,

    /// Speaker used at start and after <<reset>>
    #[clap(long, default_value = "297a5b91-f88a-6951-5841-f1e648b2e594")]
    pub speaker_uuid: String,

    /// Style used at start and after <<reset>>
    #[clap(long, default_value_t = 33)]
    pub style_id: i64,

    /// Stereo position used at start and after <<reset>>
    #[clap(long, default_value = "center")]
    pub position: StereoPosition,

    /// Audio inserted by <<silent>>
    #[clap(long, default_value = DEFAULT_SILENCE_ASSET)]
    pub silence: PathBuf,

    #[clap(long, value_enum, default_value_t = Backend::Ffmpeg)]
    pub backend: Backend,

    /// ffmpeg executable used by the ffmpeg backend
    #[clap(long, default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// Play the result with ffplay when done
    #[clap(long)]
    pub play: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Concatenate and pan through ffmpeg
    Ffmpeg,
    /// Concatenate and pan WAV files in-process
    Native,
}
