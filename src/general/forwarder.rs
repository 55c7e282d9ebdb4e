use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::general::payload::ShortMessage;
use crate::io::devices::{DeviceDescriptor, MidiBackend};
use crate::io::output::{open_named_output, ShortMessageOutput};

#[derive(Debug, Default)]
pub struct SinkStats {
    pub sent: AtomicU64,
    pub failed: AtomicU64,
}

/// Cloneable entry point to the sink. Every clone feeds the same forwarding
/// thread, so transmissions are serialized no matter how many callers there are.
#[derive(Clone)]
pub struct SinkHandle {
    tx: Sender<ShortMessage>,
}

impl SinkHandle {
    /// Queue one short message. Returns once queued, not once delivered.
    pub fn send(&self, msg: ShortMessage) -> Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| Error::Midi("MIDI forwarding thread has stopped".to_string()))
    }
}

/// The single bound MIDI output of a session.
pub struct OutputSink {
    device: DeviceDescriptor,
    handle: SinkHandle,
    stats: Arc<SinkStats>,
    forwarder: thread::JoinHandle<()>,
}

impl OutputSink {
    /// Resolve `output_name` and move the opened output into a forwarding thread.
    pub fn bind(backend: &dyn MidiBackend, output_name: &str) -> Result<Self> {
        let (device, output) = open_named_output(backend, output_name)?;
        let (tx, rx) = channel();
        let stats = Arc::new(SinkStats::default());
        let forwarder = spawn_forwarder(output, rx, Arc::clone(&stats));
        Ok(Self {
            device,
            handle: SinkHandle { tx },
            stats,
            forwarder,
        })
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn handle(&self) -> SinkHandle {
        self.handle.clone()
    }

    pub fn stats(&self) -> Arc<SinkStats> {
        Arc::clone(&self.stats)
    }

    /// Drop this sink's sender and wait for the forwarder to drain. Returns
    /// only after every other `SinkHandle` clone is gone too.
    pub fn close(self) {
        drop(self.handle);
        if self.forwarder.join().is_err() {
            error!("MIDI forwarding thread panicked");
        }
    }
}

/// Spawn a forwarding thread that owns `output` and writes every message
/// received on `rx`, in order. The thread exits when all senders are dropped.
fn spawn_forwarder(
    mut output: Box<dyn ShortMessageOutput + Send>,
    rx: Receiver<ShortMessage>,
    stats: Arc<SinkStats>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for msg in rx {
            match output.send_short(msg.status, msg.data1, msg.data2) {
                Ok(()) => {
                    stats.sent.fetch_add(1, Ordering::Relaxed);
                    debug!("sent MIDI bytes {} {} {}", msg.status, msg.data1, msg.data2);
                }
                Err(err) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    error!("Error sending MIDI message to output: {}", err);
                }
            }
        }
        debug!("MIDI forwarding thread exiting");
    })
}
