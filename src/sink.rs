use crate::error::ControlError;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use rosc::{encoder, OscMessage, OscPacket};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Anything that can put a text command on the wire. Delivery is best-effort:
/// a failed send is reported once and never retried.
pub trait CommandSink {
    fn transmit(&self, command: &str) -> Result<(), ControlError>;
}

/// Fire-and-forget UDP transmitter, one ASCII command per datagram.
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

fn open_socket(bind_address: &str, target_ip: &str, target_port: u16) -> Result<(UdpSocket, SocketAddr)> {
    let target = (target_ip, target_port)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve {}:{}", target_ip, target_port))?
        .next()
        .with_context(|| format!("No address for {}:{}", target_ip, target_port))?;

    debug!("[NET] Binding to address: {}", bind_address);
    let socket = UdpSocket::bind(bind_address)
        .with_context(|| format!("Failed to bind UDP socket on {}", bind_address))?;
    Ok((socket, target))
}

fn send(socket: &UdpSocket, target: SocketAddr, command: &str, payload: &[u8]) -> Result<(), ControlError> {
    socket
        .send_to(payload, target)
        .map(|_| debug!("[NET] sent {:?} to {}", command, target))
        .map_err(|source| ControlError::TransmitFailure {
            command: command.to_string(),
            source,
        })
}

impl UdpSink {
    pub fn new(bind_address: &str, target_ip: &str, target_port: u16) -> Result<Self> {
        let (socket, target) = open_socket(bind_address, target_ip, target_port)?;
        info!("[NET] UDP client configured to send to {}", target);
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl CommandSink for UdpSink {
    fn transmit(&self, command: &str) -> Result<(), ControlError> {
        send(&self.socket, self.target, command, command.as_bytes())
    }
}

/// OSC client for the QLab machine. Each command is an OSC address sent as a
/// message without arguments.
pub struct OscSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl OscSink {
    pub fn new(bind_address: &str, target_ip: &str, target_port: u16) -> Result<Self> {
        let (socket, target) = open_socket(bind_address, target_ip, target_port)?;
        info!("[NET] OSC client configured to send to {}", target);
        Ok(Self { socket, target })
    }
}

impl CommandSink for OscSink {
    fn transmit(&self, address: &str) -> Result<(), ControlError> {
        let packet = OscPacket::Message(OscMessage {
            addr: address.to_string(),
            args: vec![],
        });
        let payload = encoder::encode(&packet).map_err(|e| ControlError::Encode {
            command: address.to_string(),
            reason: format!("{:?}", e),
        })?;
        send(&self.socket, self.target, address, &payload)
    }
}

/// Used when the UDP socket could not be set up. Commands are logged and dropped.
pub struct OfflineSink;

impl CommandSink for OfflineSink {
    fn transmit(&self, command: &str) -> Result<(), ControlError> {
        warn!("[NET] offline, dropping {:?}", command);
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every command it is handed.
    #[derive(Default)]
    pub struct RecordingSink {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        pub fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        pub fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    impl CommandSink for RecordingSink {
        fn transmit(&self, command: &str) -> Result<(), ControlError> {
            self.sent.lock().unwrap().push(command.to_string());
            Ok(())
        }
    }

    /// Rejects every command, counting attempts.
    #[derive(Default)]
    pub struct FailingSink {
        attempts: Mutex<usize>,
    }

    impl FailingSink {
        pub fn attempts(&self) -> usize {
            *self.attempts.lock().unwrap()
        }
    }

    impl CommandSink for FailingSink {
        fn transmit(&self, command: &str) -> Result<(), ControlError> {
            *self.attempts.lock().unwrap() += 1;
            Err(ControlError::TransmitFailure {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "network unreachable"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_udp_sink_sends_one_datagram_per_command() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let port = receiver.local_addr().unwrap().port();

        let sink = UdpSink::new("127.0.0.1:0", "127.0.0.1", port).unwrap();
        sink.transmit("LZ2W6").unwrap();
        sink.transmit("MSTON").unwrap();

        let mut buf = [0u8; 64];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"LZ2W6");
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"MSTON");
    }

    #[test]
    fn test_osc_sink_sends_argumentless_messages() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let port = receiver.local_addr().unwrap().port();

        let sink = OscSink::new("127.0.0.1:0", "127.0.0.1", port).unwrap();
        sink.transmit("/cue/SC1/go").unwrap();

        let mut buf = [0u8; 1536];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        match rosc::decoder::decode_udp(&buf[..n]).unwrap() {
            (_, OscPacket::Message(msg)) => {
                assert_eq!(msg.addr, "/cue/SC1/go");
                assert!(msg.args.is_empty());
            }
            (_, packet) => panic!("expected a message, got {:?}", packet),
        }
    }

    #[test]
    fn test_udp_sink_rejects_bad_bind_address() {
        assert!(UdpSink::new("not-an-address", "127.0.0.1", 33).is_err());
    }

    #[test]
    fn test_offline_sink_swallows_commands() {
        assert!(OfflineSink.transmit("LEDON").is_ok());
    }
}
