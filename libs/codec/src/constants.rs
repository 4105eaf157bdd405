//! Protocol-level constants for the market update wire format
//!
//! These values are part of the wire format. A receiver frames records purely
//! from the header count and [`RECORD_SIZE`], so they MUST stay consistent
//! between the generator and every consumer.

/// Protocol tag carried in the first two bytes of every framed datagram
pub const PROTOCOL_MARKET_UPDATE: u16 = 0x6666;

/// Encoded size of one market update record
///
/// ```text
/// ┌───────────┬─────────┬─────────┬──────┬──────────────┐
/// │ timestamp │ price   │ size    │ side │ reserved     │
/// │ u64 (0-7) │ f64     │ f64     │ u8   │ u8[7] zeroed │
/// │           │ (8-15)  │ (16-23) │ (24) │ (25-31)      │
/// └───────────┴─────────┴─────────┴──────┴──────────────┘
/// ```
pub const RECORD_SIZE: usize = 32;

/// Bytes of live (non-padding) fields at the front of a record
pub const RECORD_LIVE_SIZE: usize = 25;

/// Encoded size of the optional packet header (protocol + count)
pub const HEADER_SIZE: usize = 4;

/// Largest record count the 16-bit header field can declare
pub const MAX_HEADER_COUNT: usize = u16::MAX as usize;

/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Records that fit in one framed datagram without exceeding [`MAX_UDP_PAYLOAD`]
pub const MAX_RECORDS_PER_DATAGRAM: usize = (MAX_UDP_PAYLOAD - HEADER_SIZE) / RECORD_SIZE;

/// Byte order of every multi-byte field on the wire
#[cfg(not(feature = "big-endian"))]
pub type WireOrder = byteorder::LittleEndian;

/// Byte order of every multi-byte field on the wire
#[cfg(feature = "big-endian")]
pub type WireOrder = byteorder::BigEndian;

/// Human-readable name of [`WireOrder`], logged when a run starts
pub const fn wire_order_name() -> &'static str {
    if cfg!(feature = "big-endian") {
        "big-endian"
    } else {
        "little-endian"
    }
}

/// Total datagram length of a framed packet carrying `count` records
#[inline(always)]
pub const fn framed_len(count: usize) -> usize {
    HEADER_SIZE + count * RECORD_SIZE
}

// Layout sanity checks evaluated at compile time
const _: () = assert!(RECORD_SIZE % 8 == 0);
const _: () = assert!(RECORD_LIVE_SIZE == 8 + 8 + 8 + 1);
const _: () = assert!(framed_len(MAX_RECORDS_PER_DATAGRAM) <= MAX_UDP_PAYLOAD);
