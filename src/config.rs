//! Runtime configuration, loaded from an optional `config.json` and then
//! overridden from the command line.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::general::payload::MIDI_SHORT_LEN;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_HOST: &str = "127.0.0.1";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OscConfig {
    pub listen_host: String,
    pub listen_port: u16,
    pub destination_host: String,
    pub destination_port: u16,
    /// Number of threads dispatching decoded messages to the router.
    pub workers: usize,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            listen_host: DEFAULT_HOST.to_string(),
            listen_port: 0,
            destination_host: DEFAULT_HOST.to_string(),
            destination_port: 0,
            workers: 2,
        }
    }
}

impl OscConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    pub fn destination_addr(&self) -> String {
        format!("{}:{}", self.destination_host, self.destination_port)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MidiConfig {
    /// Exact name of the MIDI output to bind.
    pub output_name: String,
    /// Upper bound on `/midi` argument count.
    pub max_arguments: usize,
    /// Client name handed to the MIDI backend.
    pub client_name: String,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            output_name: String::new(),
            max_arguments: MIDI_SHORT_LEN,
            client_name: "osc2midi".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub osc: OscConfig,
    pub midi: MidiConfig,
    pub verbose: bool,
}

impl Config {
    /// Parse a config from JSON text. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given (it must exist), else `config.json` in the
    /// working directory if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = fs::read_to_string(p)?;
                debug!("loaded config from {}", p.display());
                Self::from_json(&text)
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    let text = fs::read_to_string(default_path)?;
                    debug!("loaded config from {}", DEFAULT_CONFIG_FILE);
                    Self::from_json(&text)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.midi.max_arguments == 0 || self.midi.max_arguments > MIDI_SHORT_LEN {
            return Err(Error::InvalidConfig(format!(
                "midi.max_arguments must be between 1 and {}, got {}",
                MIDI_SHORT_LEN, self.midi.max_arguments
            )));
        }
        if self.osc.workers == 0 {
            return Err(Error::InvalidConfig("osc.workers must be at least 1".to_string()));
        }
        Ok(())
    }
}
