//! Transport Error Types
//!
//! Failures of the datagram send path: setting a sender up, and individual
//! sends. Setup failures abort a run; send failures are counted and the run
//! moves on.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    /// Destination string could not be turned into a socket address
    #[error("Cannot resolve destination {destination}: {reason}")]
    Resolve { destination: String, reason: String },

    #[error("Failed to bind UDP socket on {local}")]
    Bind {
        local: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Failed to connect UDP socket to {remote}")]
    Connect {
        remote: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// A single datagram did not go out
    #[error("Send failed: {message}")]
    Send {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("Datagram of {size} bytes exceeds the {limit} byte limit")]
    Oversized { size: usize, limit: usize },

    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    /// Send failure without an underlying OS error
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
            source: None,
        }
    }

    /// Send failure reported by the socket
    pub fn send_failed(remote: SocketAddr, source: io::Error) -> Self {
        Self::Send {
            message: format!("{} ({})", remote, source.kind()),
            source: Some(source),
        }
    }

    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    /// Whether a later send to the same destination may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Send { .. } | TransportError::Io(_))
    }

    /// Short label used in log fields
    pub fn category(&self) -> &'static str {
        match self {
            TransportError::Resolve { .. } => "resolve",
            TransportError::Bind { .. } => "bind",
            TransportError::Connect { .. } => "connect",
            TransportError::Send { .. } => "send",
            TransportError::Oversized { .. } => "oversized",
            TransportError::Configuration { .. } => "configuration",
            TransportError::Io(_) => "io",
        }
    }
}
