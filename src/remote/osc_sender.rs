use std::net::UdpSocket;

use rosc::{encoder, OscMessage, OscPacket};
use tracing::debug;

use crate::error::{Error, Result};
use crate::general::decode::decode_outbound_token;

/// Build one OSC message from a textual address and untyped argument tokens.
pub fn compose<S: AsRef<str>>(address: &str, tokens: &[S]) -> Result<OscMessage> {
    if !address.starts_with('/') {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    Ok(OscMessage {
        addr: address.to_string(),
        args: tokens.iter().map(|t| decode_outbound_token(t.as_ref())).collect(),
    })
}

/// Send a single OSC message to `target_addr` from an ephemeral local socket.
/// Fire-and-forget: returns the byte count handed to the socket.
pub fn send_message(msg: OscMessage, target_addr: &str) -> Result<usize> {
    let socket = UdpSocket::bind("127.0.0.1:0")?;
    socket.connect(target_addr)?;
    let msg_buf = encoder::encode(&OscPacket::Message(msg))?;
    let bytes_sent = socket.send(&msg_buf)?;
    debug!("[OSC] Sent {} bytes to {}", bytes_sent, target_addr);
    Ok(bytes_sent)
}

/// Compose and send in one step.
pub fn send_command<S: AsRef<str>>(target_addr: &str, address: &str, tokens: &[S]) -> Result<usize> {
    let msg = compose(address, tokens)?;
    send_message(msg, target_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{decoder, OscType};
    use std::time::Duration;

    #[test]
    fn test_compose_infers_each_token() {
        let msg = compose("/midi", &["144", "60", "0.5", "abc"]).unwrap();
        assert_eq!(msg.addr, "/midi");
        assert_eq!(
            msg.args,
            vec![
                OscType::Int(144),
                OscType::Int(60),
                OscType::Float(0.5),
                OscType::String("abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_compose_requires_leading_slash() {
        assert!(matches!(compose("midi", &["1"]), Err(Error::InvalidAddress(a)) if a == "midi"));
        assert!(matches!(compose::<&str>("", &[]), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_compose_without_args() {
        let msg = compose::<String>("/ping", &[]).unwrap();
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_send_command_roundtrip() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let target = receiver.local_addr().unwrap().to_string();

        let sent = send_command(&target, "/midi", &["144", "60", "100"]).unwrap();

        let mut buf = [0u8; decoder::MTU];
        let (size, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(size, sent);
        match decoder::decode_udp(&buf[..size]).unwrap().1 {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/midi");
                assert_eq!(msg.args, vec![OscType::Int(144), OscType::Int(60), OscType::Int(100)]);
            }
            other => panic!("expected message, got {:?}", other),
        }
    }
}
