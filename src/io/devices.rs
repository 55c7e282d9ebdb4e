use std::fmt;

use midir::{MidiInput, MidiOutput};
use tracing::{debug, warn};

use crate::error::Result;
use crate::io::output::{MidirOutput, ShortMessageOutput};

/// One MIDI endpoint as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: usize,
    pub name: String,
    pub is_input: bool,
    pub is_output: bool,
}

impl fmt::Display for DeviceDescriptor {
    /// One line per capability, `MIDI Output 3 is Foo`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if self.is_output {
            write!(f, "MIDI Output {} is {}", self.id, self.name)?;
            first = false;
        }
        if self.is_input {
            if !first {
                writeln!(f)?;
            }
            write!(f, "MIDI Input {} is {}", self.id, self.name)?;
        }
        Ok(())
    }
}

/// Access to the MIDI system: enumeration and opening outputs.
pub trait MidiBackend {
    /// All devices in enumeration order.
    fn devices(&self) -> Result<Vec<DeviceDescriptor>>;

    /// Open an output-capable device for writing.
    fn open_output(&self, device: &DeviceDescriptor) -> Result<Box<dyn ShortMessageOutput + Send>>;
}

/// `midir` backend. Input ports are numbered first, then output ports.
pub struct MidirBackend {
    client_name: String,
}

impl MidirBackend {
    pub fn new(client_name: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
        }
    }
}

impl MidiBackend for MidirBackend {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>> {
        let midi_in = MidiInput::new(&format!("{} enumerate input", self.client_name))?;
        let midi_out = MidiOutput::new(&format!("{} enumerate output", self.client_name))?;

        let mut inputs = Vec::new();
        for p in midi_in.ports().iter() {
            match midi_in.port_name(p) {
                Ok(name) => inputs.push(name),
                Err(err) => warn!("skipping MIDI input with unreadable name: {}", err),
            }
        }
        let mut outputs = Vec::new();
        for p in midi_out.ports().iter() {
            match midi_out.port_name(p) {
                Ok(name) => outputs.push(name),
                Err(err) => warn!("skipping MIDI output with unreadable name: {}", err),
            }
        }
        let devices = number_ports(inputs, outputs);
        debug!("enumerated {} MIDI devices", devices.len());
        Ok(devices)
    }

    fn open_output(&self, device: &DeviceDescriptor) -> Result<Box<dyn ShortMessageOutput + Send>> {
        let output = MidirOutput::connect(&self.client_name, &device.name)?;
        Ok(Box::new(output))
    }
}

/// Descriptors for port names, ids assigned inputs first, then outputs.
pub fn number_ports(inputs: Vec<String>, outputs: Vec<String>) -> Vec<DeviceDescriptor> {
    let ins = inputs.into_iter().map(|name| (name, true));
    let outs = outputs.into_iter().map(|name| (name, false));
    ins.chain(outs)
        .enumerate()
        .map(|(id, (name, is_input))| DeviceDescriptor {
            id,
            name,
            is_input,
            is_output: !is_input,
        })
        .collect()
}

/// Print every device, one line per capability.
pub fn list_devices(backend: &dyn MidiBackend) -> Result<Vec<DeviceDescriptor>> {
    let devices = backend.devices()?;
    if devices.is_empty() {
        println!("No MIDI devices found");
    }
    for dev in &devices {
        println!("{}", dev);
    }
    Ok(devices)
}
