use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rosc::{decoder, OscMessage, OscPacket};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};

/// Called once per received message, possibly from several threads at once.
pub type MessageCallback = Arc<dyn Fn(&OscMessage) + Send + Sync>;

const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// A running listener. Dropping it stops the receive loop and its workers.
pub struct ListenerHandle {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    threads: Vec<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Block until the listener threads finish. In normal operation they
    /// never do, so this blocks until the process is killed.
    pub fn wait(mut self) {
        for t in self.threads.drain(..) {
            if t.join().is_err() {
                error!("OSC listener thread panicked");
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for t in self.threads.drain(..) {
            let _ = t.join();
        }
    }
}

/// Bind a UDP socket on `bind_addr` and start receiving OSC.
///
/// The bind happens before this returns, so a bad address is reported to
/// the caller. Decoded messages are fanned out to `workers` dispatch
/// threads which call `callback`.
pub fn spawn_osc_listener(
    bind_addr: &str,
    workers: usize,
    callback: MessageCallback,
) -> Result<ListenerHandle> {
    let socket = UdpSocket::bind(bind_addr).map_err(|source| Error::Bind {
        addr: bind_addr.to_string(),
        source,
    })?;
    // Timeout so the loop can notice the stop flag.
    socket.set_read_timeout(Some(READ_TIMEOUT))?;
    let local_addr = socket.local_addr()?;
    debug!("OSC listener bound on {}", local_addr);

    let stop = Arc::new(AtomicBool::new(false));
    let (tx, rx) = channel::<OscMessage>();
    let rx = Arc::new(Mutex::new(rx));

    let mut threads = Vec::with_capacity(workers + 1);
    for n in 0..workers.max(1) {
        let rx = Arc::clone(&rx);
        let callback = Arc::clone(&callback);
        threads.push(
            thread::Builder::new()
                .name(format!("osc-dispatch-{}", n))
                .spawn(move || dispatch_worker(rx, callback))?,
        );
    }

    let stop_recv = Arc::clone(&stop);
    threads.push(
        thread::Builder::new()
            .name("osc-listener".to_string())
            .spawn(move || receive_loop(socket, tx, stop_recv))?,
    );

    Ok(ListenerHandle {
        local_addr,
        stop,
        threads,
    })
}

fn receive_loop(socket: UdpSocket, tx: Sender<OscMessage>, stop: Arc<AtomicBool>) {
    let mut buf = [0u8; decoder::MTU];

    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }

        match socket.recv_from(&mut buf) {
            Ok((size, peer_addr)) => match decoder::decode_udp(&buf[..size]) {
                Ok((_, OscPacket::Message(msg))) => {
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
                Ok((_, OscPacket::Bundle(bundle))) => {
                    debug!(
                        "ignoring OSC bundle with {} elements from {}",
                        bundle.content.len(),
                        peer_addr
                    );
                }
                Err(err) => {
                    warn!("OSC decode error from {}: {}", peer_addr, err);
                }
            },
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(err) => {
                error!("OSC recv error: {}", err);
            }
        }
    }

    debug!("OSC listener exiting");
}

fn dispatch_worker(rx: Arc<Mutex<Receiver<OscMessage>>>, callback: MessageCallback) {
    loop {
        let next = match rx.lock() {
            Ok(guard) => guard.recv(),
            Err(_) => break,
        };
        match next {
            Ok(msg) => callback(&msg),
            // Sender dropped: receive loop has exited.
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{encoder, OscType};
    use std::time::Instant;

    fn send(to: SocketAddr, packet: &OscPacket) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.send_to(&encoder::encode(packet).unwrap(), to).unwrap();
    }

    fn wait_for(seen: &Mutex<Vec<String>>, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let current = seen.lock().unwrap().clone();
            if current.len() >= count || Instant::now() >= deadline {
                return current;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_receives_messages_and_ignores_garbage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        let listener = spawn_osc_listener(
            "127.0.0.1:0",
            2,
            Arc::new(move |m: &OscMessage| seen_cb.lock().unwrap().push(m.addr.clone())),
        )
        .unwrap();
        let addr = listener.local_addr();

        let garbage = UdpSocket::bind("127.0.0.1:0").unwrap();
        garbage.send_to(b"not osc", addr).unwrap();
        send(
            addr,
            &OscPacket::Message(OscMessage {
                addr: "/midi".to_string(),
                args: vec![OscType::Int(1)],
            }),
        );

        assert_eq!(wait_for(&seen, 1), vec!["/midi".to_string()]);
    }

    #[test]
    fn test_bind_failure_is_reported() {
        let taken = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap().to_string();
        let res = spawn_osc_listener(&addr, 1, Arc::new(|_: &OscMessage| {}));
        assert!(matches!(res, Err(Error::Bind { .. })));
    }

    #[test]
    fn test_drop_stops_threads() {
        let listener = spawn_osc_listener("127.0.0.1:0", 3, Arc::new(|_: &OscMessage| {})).unwrap();
        let addr = listener.local_addr();
        drop(listener);
        // port is free again once the receive loop is gone
        assert!(UdpSocket::bind(addr).is_ok());
    }
}
