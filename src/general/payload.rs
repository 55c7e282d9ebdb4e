//! Maps a `/midi` argument list onto a 3-byte MIDI short message.

use rosc::OscType;

use crate::error::{Error, Result};
use crate::general::decode::decode_inbound_int;

/// Bytes in a MIDI short message (status, data1, data2).
pub const MIDI_SHORT_LEN: usize = 3;

/// A MIDI short message as decoded from OSC.
///
/// Values are not clamped to 0..=255; narrowing happens at the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortMessage {
    pub status: i64,
    pub data1: i64,
    pub data2: i64,
}

impl ShortMessage {
    pub fn new(status: i64, data1: i64, data2: i64) -> Self {
        Self { status, data1, data2 }
    }

    pub fn to_array(self) -> [i64; MIDI_SHORT_LEN] {
        [self.status, self.data1, self.data2]
    }
}

impl From<[i64; MIDI_SHORT_LEN]> for ShortMessage {
    fn from(b: [i64; MIDI_SHORT_LEN]) -> Self {
        Self::new(b[0], b[1], b[2])
    }
}

/// Build a short message from `count` arguments, pulling each through
/// `decode`. Fails on the first argument that does not decode; nothing
/// partial is returned. Missing trailing bytes are zero.
pub fn build<F>(count: usize, max_arguments: usize, mut decode: F) -> Result<ShortMessage>
where
    F: FnMut(usize) -> Result<i64>,
{
    if count == 0 {
        return Err(Error::NoArguments);
    }
    let max = max_arguments.min(MIDI_SHORT_LEN);
    if count > max {
        return Err(Error::TooManyArguments { count, max });
    }

    let mut b = [0i64; MIDI_SHORT_LEN];
    for (n, slot) in b.iter_mut().enumerate().take(count) {
        *slot = decode(n)?;
    }
    Ok(ShortMessage::from(b))
}

/// Build a short message straight from OSC arguments.
pub fn from_osc_args(args: &[OscType], max_arguments: usize) -> Result<ShortMessage> {
    build(args.len(), max_arguments, |n| decode_inbound_int(&args[n], n))
}
