use midir::{MidiOutput, MidiOutputConnection};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::devices::{DeviceDescriptor, MidiBackend};

/// An open MIDI output that can transmit short messages.
pub trait ShortMessageOutput {
    fn send_short(&mut self, status: i64, data1: i64, data2: i64) -> Result<()>;
}

/// `midir` output connection.
pub struct MidirOutput {
    conn: MidiOutputConnection,
}

impl MidirOutput {
    /// Connect to the first output port whose name equals `port_name`.
    pub fn connect(client_name: &str, port_name: &str) -> Result<Self> {
        let midi_out = MidiOutput::new(client_name)?;
        let ports = midi_out.ports();
        let mut found = None;
        for p in ports.iter() {
            if let Ok(name) = midi_out.port_name(p) {
                if name == port_name {
                    found = Some(p.clone());
                    break;
                }
            }
        }
        let port = found.ok_or_else(|| Error::OutputNotFound(port_name.to_string()))?;
        let conn = midi_out.connect(&port, &format!("{} output", client_name))?;
        Ok(Self { conn })
    }
}

/// Low 8 bits, as the transport takes bytes.
fn to_byte(value: i64) -> u8 {
    let b = value as u8;
    if b as i64 != value {
        debug!("MIDI value {} narrowed to {}", value, b);
    }
    b
}

impl ShortMessageOutput for MidirOutput {
    fn send_short(&mut self, status: i64, data1: i64, data2: i64) -> Result<()> {
        let bytes = [to_byte(status), to_byte(data1), to_byte(data2)];
        self.conn.send(&bytes)?;
        Ok(())
    }
}

/// First output-capable device whose name equals `output_name` exactly.
pub fn find_output<'a>(devices: &'a [DeviceDescriptor], output_name: &str) -> Option<&'a DeviceDescriptor> {
    devices.iter().find(|d| d.is_output && d.name == output_name)
}

/// Resolve `output_name` against the backend's devices and open it.
pub fn open_named_output(
    backend: &dyn MidiBackend,
    output_name: &str,
) -> Result<(DeviceDescriptor, Box<dyn ShortMessageOutput + Send>)> {
    let devices = backend.devices()?;
    let device = find_output(&devices, output_name)
        .ok_or_else(|| Error::OutputNotFound(output_name.to_string()))?
        .clone();
    let output = backend.open_output(&device)?;
    info!("MIDI Output {} is {}", device.id, device.name);
    Ok((device, output))
}
