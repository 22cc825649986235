use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// A bracketed script line that does not match the directive vocabulary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    #[error("unknown directive `{0}`")]
    UnknownDirective(String),

    #[error("directive `{0}` requires an argument")]
    MissingArgument(&'static str),

    #[error("directive `{0}` takes no argument")]
    UnexpectedArgument(&'static str),

    #[error("`{value}` is not a valid {expected} for `{name}`")]
    InvalidNumber {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("unknown position `{0}` (expected left, center or right)")]
    UnknownPosition(String),

    #[error("unknown scale control `{0}` (expected speed, volume, pitch or intonation)")]
    UnknownScale(String),

    #[error("malformed scale pair `{0}` (expected key:value)")]
    MalformedPair(String),
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("synthesis request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("synthesis service returned {status}: {body}")]
    Service { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` {operation} exited with {status}")]
    ToolFailed {
        program: String,
        operation: &'static str,
        status: ExitStatus,
    },

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    #[error("cannot concatenate {first} with {second}: formats differ")]
    IncompatibleFormat { first: PathBuf, second: PathBuf },

    #[error("audio file not found: {0}")]
    MissingAsset(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("line {line_no}: malformed directive `{line}`: {source}")]
    Malformed {
        line_no: usize,
        line: String,
        #[source]
        source: DirectiveError,
    },

    #[error("line {line_no}: {source}")]
    Synthesis {
        line_no: usize,
        #[source]
        source: SynthesisError,
    },

    #[error("line {line_no}: {source}")]
    Audio {
        line_no: usize,
        #[source]
        source: AudioError,
    },

    #[error("failed to read scenario: {0}")]
    Read(#[from] std::io::Error),
}
