//! The bridge session: bind one MIDI output, then listen for OSC forever.
//!
//! `Unbound -> Bound -> Listening -> Terminated`. There is no way back; a
//! different output needs a new session.

use std::net::SocketAddr;
use std::sync::Arc;

use rosc::OscMessage;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::general::forwarder::{OutputSink, SinkStats};
use crate::general::router::Router;
use crate::io::devices::{DeviceDescriptor, MidiBackend};
use crate::remote::osc_listener::{spawn_osc_listener, ListenerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Bound,
    Listening,
    Terminated,
}

pub struct BridgeSession {
    config: Config,
    state: SessionState,
    // drop order matters: listener threads hold router clones, router holds a sink handle
    listener: Option<ListenerHandle>,
    router: Option<Arc<Router>>,
    sink: Option<OutputSink>,
}

impl BridgeSession {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: SessionState::Unbound,
            listener: None,
            router: None,
            sink: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bind the configured output. Only valid once, from `Unbound`; on
    /// failure the session stays `Unbound`.
    pub fn bind(&mut self, backend: &dyn MidiBackend) -> Result<&DeviceDescriptor> {
        if self.state != SessionState::Unbound {
            return Err(Error::InvalidState(format!(
                "cannot bind a MIDI output in state {:?}",
                self.state
            )));
        }
        let sink = OutputSink::bind(backend, &self.config.midi.output_name)?;
        if self.config.verbose {
            debug!("bound MIDI output {:?}", sink.device());
        }
        self.state = SessionState::Bound;
        Ok(self.sink.insert(sink).device())
    }

    /// Start the OSC listener with the `/midi` router attached. Only valid
    /// from `Bound`; a bind failure on the socket leaves the session `Bound`.
    pub fn listen(&mut self) -> Result<SocketAddr> {
        let sink = match (&self.state, &self.sink) {
            (SessionState::Bound, Some(sink)) => sink,
            _ => {
                return Err(Error::InvalidState(format!(
                    "cannot start listening in state {:?}",
                    self.state
                )))
            }
        };

        let router = Arc::new(Router::bridge(
            sink.handle(),
            self.config.midi.max_arguments,
            self.config.verbose,
        ));
        let dispatch_router = Arc::clone(&router);
        let listener = spawn_osc_listener(
            &self.config.osc.listen_addr(),
            self.config.osc.workers,
            Arc::new(move |msg: &OscMessage| {
                dispatch_router.dispatch(msg);
            }),
        )?;

        let addr = listener.local_addr();
        if self.config.verbose {
            info!("Now listening for OSC on {}", addr);
        }
        self.router = Some(router);
        self.listener = Some(listener);
        self.state = SessionState::Listening;
        Ok(addr)
    }

    /// `bind` then `listen`.
    pub fn start(config: Config, backend: &dyn MidiBackend) -> Result<Self> {
        let mut session = Self::new(config);
        session.bind(backend)?;
        session.listen()?;
        Ok(session)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    pub fn device(&self) -> Option<&DeviceDescriptor> {
        self.sink.as_ref().map(OutputSink::device)
    }

    pub fn router(&self) -> Option<&Router> {
        self.router.as_deref()
    }

    pub fn sink_stats(&self) -> Option<Arc<SinkStats>> {
        self.sink.as_ref().map(OutputSink::stats)
    }

    /// Serve until the listener stops, which in practice is never.
    pub fn run(mut self) -> SessionState {
        if let Some(listener) = self.listener.take() {
            listener.wait();
        }
        self.state = SessionState::Terminated;
        self.state
    }
}
