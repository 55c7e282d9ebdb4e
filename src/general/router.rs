//! Exact-match routing of OSC addresses to handlers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rosc::OscMessage;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::general::forwarder::SinkHandle;
use crate::general::payload;

pub const MIDI_ADDRESS: &str = "/midi";

/// A message handler. May be called from several dispatch threads at once.
pub type Handler = Arc<dyn Fn(&OscMessage) -> Result<()> + Send + Sync>;

#[derive(Debug, Default)]
pub struct RouterStats {
    pub handled: AtomicU64,
    pub dropped: AtomicU64,
    pub unrecognized: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    /// The handler rejected the message; it was logged and discarded.
    Dropped,
    Unrecognized,
}

pub struct Router {
    routes: HashMap<String, Handler>,
    stats: RouterStats,
    verbose: bool,
}

impl Router {
    pub fn new(verbose: bool) -> Self {
        Self {
            routes: HashMap::new(),
            stats: RouterStats::default(),
            verbose,
        }
    }

    /// Router with `/midi` wired to `sink`.
    pub fn bridge(sink: SinkHandle, max_arguments: usize, verbose: bool) -> Self {
        let mut router = Self::new(verbose);
        router.register(MIDI_ADDRESS, midi_handler(sink, max_arguments, verbose));
        router
    }

    pub fn register(&mut self, address: &str, handler: Handler) {
        self.routes.insert(address.to_string(), handler);
    }

    pub fn addresses(&self) -> Vec<&str> {
        let mut addrs: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        addrs.sort_unstable();
        addrs
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    pub fn dispatch(&self, msg: &OscMessage) -> Dispatch {
        let Some(handler) = self.routes.get(&msg.addr) else {
            self.stats.unrecognized.fetch_add(1, Ordering::Relaxed);
            if self.verbose {
                info!("Unrecognized OSC message: {} {:?}", msg.addr, msg.args);
            }
            return Dispatch::Unrecognized;
        };
        match handler(msg) {
            Ok(()) => {
                self.stats.handled.fetch_add(1, Ordering::Relaxed);
                Dispatch::Handled
            }
            Err(err) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("OSC {} message dropped: {}", msg.addr, err);
                Dispatch::Dropped
            }
        }
    }
}

/// Decode `/midi` arguments into a short message and queue it on `sink`.
pub fn midi_handler(sink: SinkHandle, max_arguments: usize, verbose: bool) -> Handler {
    Arc::new(move |msg: &OscMessage| -> Result<()> {
        let short = payload::from_osc_args(&msg.args, max_arguments)?;
        if verbose {
            debug!(
                "handleOSC: sending MIDI bytes {} {} {}",
                short.status, short.data1, short.data2
            );
        }
        sink.send(short)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rosc::OscType;
    use std::sync::Mutex;

    fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    fn recording_router() -> (Router, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        let mut router = Router::new(true);
        router.register(
            MIDI_ADDRESS,
            Arc::new(move |m: &OscMessage| -> Result<()> {
                seen_in.lock().unwrap().push(m.addr.clone());
                Ok(())
            }),
        );
        (router, seen)
    }

    #[test]
    fn test_exact_address_only() {
        let (router, seen) = recording_router();
        assert_eq!(router.dispatch(&msg("/midi", vec![])), Dispatch::Handled);
        for addr in ["/midi/", "/MIDI", "/mid", "midi", "/midi*", "/*"] {
            assert_eq!(router.dispatch(&msg(addr, vec![])), Dispatch::Unrecognized, "{}", addr);
        }
        assert_eq!(*seen.lock().unwrap(), vec!["/midi".to_string()]);
        assert_eq!(router.stats().unrecognized.load(Ordering::Relaxed), 6);
        assert_eq!(router.stats().handled.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_handler_error_is_dropped_not_fatal() {
        let mut router = Router::new(false);
        router.register("/fail", Arc::new(|_: &OscMessage| -> Result<()> { Err(Error::NoArguments) }));
        assert_eq!(router.dispatch(&msg("/fail", vec![])), Dispatch::Dropped);
        assert_eq!(router.dispatch(&msg("/fail", vec![])), Dispatch::Dropped);
        assert_eq!(router.stats().dropped.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_registry_is_data() {
        let mut router = Router::new(false);
        router.register("/b", Arc::new(|_: &OscMessage| -> Result<()> { Ok(()) }));
        router.register("/a", Arc::new(|_: &OscMessage| -> Result<()> { Ok(()) }));
        assert_eq!(router.addresses(), vec!["/a", "/b"]);
        assert_eq!(router.dispatch(&msg("/a", vec![])), Dispatch::Handled);
    }

    #[test]
    fn test_midi_route_to_sink() {
        use crate::general::forwarder::OutputSink;
        use crate::test_utils::FakeBackend;

        let backend = FakeBackend::with_outputs(&["Synth"]);
        let sink = OutputSink::bind(&backend, "Synth").unwrap();
        let router = Router::bridge(sink.handle(), 3, false);

        let cases = vec![
            (vec![OscType::Int(64)], Dispatch::Handled),
            (vec![], Dispatch::Dropped),
            (vec![OscType::Int(1); 4], Dispatch::Dropped),
            (vec![OscType::Int(144), OscType::Float(60.0)], Dispatch::Dropped),
            (vec![OscType::Int(144), OscType::Int(60), OscType::Int(100)], Dispatch::Handled),
        ];
        for (args, expected) in cases {
            assert_eq!(router.dispatch(&msg(MIDI_ADDRESS, args)), expected);
        }
        assert_eq!(router.dispatch(&msg("/midi/", vec![OscType::Int(1)])), Dispatch::Unrecognized);

        drop(router);
        sink.close();
        assert_eq!(backend.sent(), vec![[64, 0, 0], [144, 60, 100]]);
    }
}
