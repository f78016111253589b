use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::thread;
use std::time::Duration;

use super::{codec, TransportError};
use crate::midi::RawControlMessage;
use crate::shutdown::ShutdownSignal;

/// How often the receive loop wakes up to check for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Largest datagram we accept. Control messages are ~24 bytes.
const MAX_DATAGRAM: usize = 1536;

/// How long to wait before the next receive. Timeouts and signals are
/// the normal idle path; anything else would repeat at once.
fn backoff_after(kind: ErrorKind) -> Duration {
    match kind {
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => Duration::ZERO,
        _ => POLL_INTERVAL,
    }
}

/// Resolve `host:port`, preferring IPv4 like most OSC peers do.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|_| TransportError::Resolve {
            host: host.to_string(),
        })?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| TransportError::Resolve {
            host: host.to_string(),
        })
}

/// Fire-and-forget sender of control messages to one destination.
pub struct OscSender {
    socket: UdpSocket,
    destination: SocketAddr,
    channel: String,
}

impl OscSender {
    pub fn new(destination: SocketAddr, channel: impl Into<String>) -> Result<Self, TransportError> {
        let bind_addr = if destination.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr)?;

        Ok(Self {
            socket,
            destination,
            channel: channel.into(),
        })
    }

    /// Resolve `host` and build a sender for it.
    pub fn connect(host: &str, port: u16, channel: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(resolve(host, port)?, channel)
    }

    /// Send one message. No retry, no acknowledgement.
    pub fn send(&self, msg: &RawControlMessage) -> Result<(), TransportError> {
        let bytes = codec::encode(&self.channel, msg)?;
        self.socket.send_to(&bytes, self.destination)?;
        log::debug!(
            "Sent {} on {} to {}",
            msg,
            self.channel,
            self.destination
        );
        Ok(())
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// Receives control messages addressed to one channel.
pub struct OscListener {
    socket: UdpSocket,
    channel: String,
}

impl OscListener {
    pub fn bind<A: ToSocketAddrs>(addr: A, channel: impl Into<String>) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;

        Ok(Self {
            socket,
            channel: channel.into(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Receive until `shutdown` is triggered, handing every valid control
    /// message on our channel to `on_message`.
    ///
    /// Malformed datagrams are logged and dropped; they never end the loop.
    pub fn serve<F>(&self, shutdown: &ShutdownSignal, mut on_message: F) -> Result<(), TransportError>
    where
        F: FnMut(RawControlMessage),
    {
        let mut buf = [0u8; MAX_DATAGRAM];

        while !shutdown.is_triggered() {
            match self.socket.recv_from(&mut buf) {
                Ok((len, peer)) => {
                    log::debug!("Received {} bytes from {}", len, peer);
                    self.handle_datagram(&buf[..len], &mut on_message);
                }
                Err(e) => {
                    let pause = backoff_after(e.kind());
                    if !pause.is_zero() {
                        // e.g. ICMP port unreachable surfacing on some platforms
                        log::warn!("UDP receive error on {}: {}", self.channel, e);
                        thread::sleep(pause);
                    }
                }
            }
        }

        log::info!("Stopped listening on {}", self.channel);
        Ok(())
    }

    /// Decode one datagram; returns how many messages were delivered.
    pub fn handle_datagram<F>(&self, datagram: &[u8], on_message: &mut F) -> usize
    where
        F: FnMut(RawControlMessage),
    {
        let messages = match codec::decode(datagram) {
            Ok(messages) => messages,
            Err(e) => {
                log::warn!("Dropping datagram: {}", e);
                return 0;
            }
        };

        let mut delivered = 0;
        for msg in messages {
            if msg.addr != self.channel {
                log::debug!("No handler for OSC address {}", msg.addr);
                continue;
            }
            match codec::payload(&msg) {
                Ok(control) => {
                    on_message(control);
                    delivered += 1;
                }
                Err(e) => log::warn!("Dropping message: {}", e),
            }
        }
        delivered
    }
}
