//! OSC to MIDI bridge.
//!
//! Receives OSC over UDP and turns `/midi` messages (up to three integer
//! arguments) into MIDI short messages on one named output. Also sends
//! single OSC messages with types inferred from text, lists MIDI devices,
//! and prints incoming OSC in a listen-only mode.

pub mod config;
pub mod error;
pub mod session;
pub mod test_utils;

pub mod general {
    pub mod check;
    pub mod decode;
    pub mod forwarder;
    pub mod payload;
    pub mod router;
}

pub mod io {
    pub mod devices;
    pub mod output;
}

pub mod remote {
    pub mod monitor;
    pub mod osc_listener;
    pub mod osc_sender;
}

pub use config::Config;
pub use error::{Error, Result};
pub use general::payload::ShortMessage;
pub use session::{BridgeSession, SessionState};
