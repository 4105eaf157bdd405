//! UDP Network Transport Implementation
//!
//! Connected, blocking UDP sender for raw datagram traffic. Payloads are sent
//! as-is with no extra framing so a receiver sees exactly the bytes the codec
//! produced.

use super::DatagramSink;
use crate::{Result, TransportError};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Instant;
use tracing::{info, trace};

/// UDP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpConfig {
    /// Local address to bind to
    pub bind_address: SocketAddr,
    /// Maximum datagram size accepted by `send_datagram`
    pub max_message_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 0)),
            max_message_size: crate::MAX_UDP_PAYLOAD,
        }
    }
}

/// UDP transport statistics
#[derive(Debug, Clone, Default)]
pub struct UdpStats {
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub errors: u64,
    pub last_activity: Option<Instant>,
}

/// Connected UDP socket sending to one destination
#[derive(Debug)]
pub struct UdpSender {
    config: UdpConfig,
    socket: UdpSocket,
    remote: SocketAddr,
    stats: UdpStats,
}

impl UdpSender {
    /// Bind per `config` and connect to `destination` (`"host:port"` or any
    /// [`ToSocketAddrs`] value). The first resolved address is used.
    pub fn connect<A: ToSocketAddrs + std::fmt::Debug>(
        destination: A,
        config: UdpConfig,
    ) -> Result<Self> {
        if config.max_message_size > crate::MAX_UDP_PAYLOAD {
            return Err(TransportError::configuration(
                format!(
                    "UDP max message size cannot exceed {} bytes",
                    crate::MAX_UDP_PAYLOAD
                ),
                Some("max_message_size"),
            ));
        }

        let remote = destination
            .to_socket_addrs()
            .map_err(|e| {
                TransportError::Resolve {
                    destination: format!("{:?}", destination),
                    reason: e.to_string(),
                }
            })?
            .next()
            .ok_or_else(|| {
                TransportError::Resolve {
                    destination: format!("{:?}", destination),
                    reason: "no addresses".to_string(),
                }
            })?;

        // An unspecified IPv4 bind cannot reach an IPv6 destination
        let bind_address = match (config.bind_address, remote) {
            (SocketAddr::V4(local), SocketAddr::V6(_)) if local.ip().is_unspecified() => {
                SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, local.port()))
            }
            (local, _) => local,
        };

        let socket = UdpSocket::bind(bind_address).map_err(|source| TransportError::Bind {
            local: bind_address,
            source,
        })?;

        socket
            .connect(remote)
            .map_err(|source| TransportError::Connect { remote, source })?;

        info!(
            "UDP sender bound to {} and connected to {}",
            socket.local_addr().map_err(TransportError::from)?,
            remote
        );

        Ok(Self {
            config,
            socket,
            remote,
            stats: UdpStats::default(),
        })
    }

    /// Destination this sender is connected to
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// Get local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Get transport statistics
    pub fn stats(&self) -> &UdpStats {
        &self.stats
    }

    pub fn config(&self) -> &UdpConfig {
        &self.config
    }
}

impl DatagramSink for UdpSender {
    fn send_datagram(&mut self, datagram: &[u8]) -> Result<usize> {
        if datagram.len() > self.config.max_message_size {
            self.stats.errors += 1;
            return Err(TransportError::Oversized {
                size: datagram.len(),
                limit: self.config.max_message_size,
            });
        }

        match self.socket.send(datagram) {
            Ok(bytes_sent) => {
                self.stats.packets_sent += 1;
                self.stats.bytes_sent += bytes_sent as u64;
                self.stats.last_activity = Some(Instant::now());
                trace!("Sent UDP datagram to {}: {} bytes", self.remote, bytes_sent);
                Ok(bytes_sent)
            }
            Err(e) => {
                self.stats.errors += 1;
                Err(TransportError::send_failed(self.remote, e))
            }
        }
    }
}
