//! In-memory MIDI backend for exercising the bridge without hardware.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::io::devices::{DeviceDescriptor, MidiBackend};
use crate::io::output::ShortMessageOutput;

#[derive(Clone, Default)]
pub struct FakeBackend {
    devices: Vec<DeviceDescriptor>,
    sent: Arc<Mutex<Vec<[i64; 3]>>>,
    opened: Arc<AtomicUsize>,
    in_flight: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
    fail_status: Option<i64>,
}

impl FakeBackend {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    /// Output-only devices with sequential ids.
    pub fn with_outputs(names: &[&str]) -> Self {
        let devices = names
            .iter()
            .enumerate()
            .map(|(id, name)| DeviceDescriptor {
                id,
                name: name.to_string(),
                is_input: false,
                is_output: true,
            })
            .collect();
        Self::new(devices)
    }

    /// Outputs reject any message whose status equals `status`.
    pub fn failing_on(mut self, status: i64) -> Self {
        self.fail_status = Some(status);
        self
    }

    /// Messages written so far, in transmission order.
    pub fn sent(&self) -> Vec<[i64; 3]> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Writes that started while another write was still running.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    /// Poll until at least `count` messages were written or `timeout` passes.
    pub fn wait_for_sent(&self, count: usize, timeout: Duration) -> Vec<[i64; 3]> {
        let deadline = Instant::now() + timeout;
        loop {
            let sent = self.sent();
            if sent.len() >= count || Instant::now() >= deadline {
                return sent;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}

impl MidiBackend for FakeBackend {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>> {
        Ok(self.devices.clone())
    }

    fn open_output(&self, device: &DeviceDescriptor) -> Result<Box<dyn ShortMessageOutput + Send>> {
        if !device.is_output {
            return Err(Error::Midi(format!("{} is not an output", device.name)));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeOutput {
            sent: Arc::clone(&self.sent),
            in_flight: Arc::clone(&self.in_flight),
            overlaps: Arc::clone(&self.overlaps),
            fail_status: self.fail_status,
        }))
    }
}

/// Holds each write open briefly so unserialized callers would collide.
struct FakeOutput {
    sent: Arc<Mutex<Vec<[i64; 3]>>>,
    in_flight: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
    fail_status: Option<i64>,
}

impl FakeOutput {
    fn write(&self, status: i64, data1: i64, data2: i64) -> Result<()> {
        if self.fail_status == Some(status) {
            return Err(Error::Midi("fake transport rejected message".to_string()));
        }
        thread::sleep(Duration::from_millis(1));
        self.sent
            .lock()
            .map_err(|_| Error::Midi("fake output poisoned".to_string()))?
            .push([status, data1, data2]);
        Ok(())
    }
}

impl ShortMessageOutput for FakeOutput {
    fn send_short(&mut self, status: i64, data1: i64, data2: i64) -> Result<()> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
            return Err(Error::Midi("overlapping write on fake output".to_string()));
        }
        let result = self.write(status, data1, data2);
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }
}
