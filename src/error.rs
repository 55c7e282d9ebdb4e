//! Error types for the bridge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("expected an int in OSC argument index={index} (got {found})")]
    TypeMismatch { index: usize, found: &'static str },

    #[error("OSC /midi message: no arguments")]
    NoArguments,

    #[error("OSC /midi message: too many arguments ({count}, at most {max})")]
    TooManyArguments { count: usize, max: usize },

    #[error("OSC address must start with '/': {0:?}")]
    InvalidAddress(String),

    #[error("no MIDI output named {0}")]
    OutputNotFound(String),

    #[error("failed to bind OSC listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error("OSC error: {0}")]
    Osc(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid session state: {0}")]
    InvalidState(String),
}

impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::Midi(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::Midi(e.to_string())
    }
}

impl From<midir::SendError> for Error {
    fn from(e: midir::SendError) -> Self {
        Error::Midi(e.to_string())
    }
}

impl From<rosc::OscError> for Error {
    fn from(e: rosc::OscError) -> Self {
        Error::Osc(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
