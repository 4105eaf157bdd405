//! Protocol-level errors for market update encoding and decoding
//!
//! Each variant carries the numbers needed to diagnose a bad buffer without
//! re-reading it: what was expected, what arrived.

use thiserror::Error;

/// Codec errors with diagnostic context
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer too short to hold one record
    #[error("Malformed record: need {need} bytes, got {got}")]
    MalformedRecord { need: usize, got: usize },

    /// Buffer too short to hold a packet header
    #[error("Malformed header: need {need} bytes, got {got}")]
    MalformedHeader { need: usize, got: usize },

    /// Header count outside the 16-bit field's usable range
    #[error("Invalid record count {count}: must be within {min}..={max}")]
    InvalidCount { count: usize, min: usize, max: usize },

    /// Framed datagram would exceed the UDP payload limit
    #[error("Packet too large: {records} records need {size} bytes, limit {limit}")]
    PacketTooLarge {
        records: usize,
        size: usize,
        limit: usize,
    },

    /// Header protocol tag is not the market update tag
    #[error("Unknown protocol tag {actual:#06x}, expected {expected:#06x}")]
    UnknownProtocol { expected: u16, actual: u16 },

    /// Datagram length disagrees with the header count
    #[error("Length mismatch: header declares {count} records ({expected} bytes), datagram has {actual} bytes")]
    LengthMismatch {
        count: u16,
        expected: usize,
        actual: usize,
    },
}

impl ProtocolError {
    /// Create a MalformedRecord error
    pub fn malformed_record(need: usize, got: usize) -> Self {
        Self::MalformedRecord { need, got }
    }

    /// Create an InvalidCount error against the header's valid range
    pub fn invalid_count(count: usize) -> Self {
        Self::InvalidCount {
            count,
            min: 1,
            max: crate::MAX_HEADER_COUNT,
        }
    }

    /// Get error category for log fields
    pub fn category(&self) -> &'static str {
        match self {
            ProtocolError::MalformedRecord { .. } => "malformed_record",
            ProtocolError::MalformedHeader { .. } => "malformed_header",
            ProtocolError::InvalidCount { .. } => "invalid_count",
            ProtocolError::PacketTooLarge { .. } => "packet_too_large",
            ProtocolError::UnknownProtocol { .. } => "unknown_protocol",
            ProtocolError::LengthMismatch { .. } => "length_mismatch",
        }
    }
}

/// Result type for codec operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
