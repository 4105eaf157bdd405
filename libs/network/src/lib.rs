//! Network Infrastructure
//!
//! Datagram transport for the market data generator: a transport-agnostic
//! [`DatagramSink`] seam plus the connected UDP sender used in production.

pub mod error;
pub mod transports;

// Re-export commonly used types
pub use error::{Result, TransportError};
pub use transports::{DatagramSink, UdpConfig, UdpSender, UdpStats};

/// Largest payload a single IPv4 UDP datagram can carry. Shared with the
/// codec so the sender limit and the framing limit stay the same number.
pub use codec::MAX_UDP_PAYLOAD;
