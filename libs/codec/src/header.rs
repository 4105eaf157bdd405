//! Packet Header Implementation
//!
//! The optional 4-byte prefix of a framed datagram. It declares how many
//! records follow so a receiver can frame them without per-record lengths.
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────────────────────┐
//! │ protocol u16 │ count u16    │ count × MarketUpdate         │
//! │ 0x6666       │ 1..=65535    │ (count × RECORD_SIZE bytes)  │
//! └──────────────┴──────────────┴──────────────────────────────┘
//! ```

use crate::constants::{HEADER_SIZE, MAX_HEADER_COUNT, PROTOCOL_MARKET_UPDATE, WireOrder};
use crate::error::{ProtocolError, ProtocolResult};
use byteorder::ByteOrder;

/// Decoded packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Payload format tag; passed through undecoded
    pub protocol: u16,
    pub count: u16,
}

impl PacketHeader {
    /// Header size in bytes
    pub const SIZE: usize = HEADER_SIZE;

    /// Build a market update header for `count` records
    pub fn new(count: usize) -> ProtocolResult<Self> {
        if count == 0 || count > MAX_HEADER_COUNT {
            return Err(ProtocolError::invalid_count(count));
        }
        Ok(Self {
            protocol: PROTOCOL_MARKET_UPDATE,
            count: count as u16,
        })
    }

    /// Encode a market update header for `count` records
    pub fn encode(count: usize) -> ProtocolResult<[u8; HEADER_SIZE]> {
        let mut out = [0u8; HEADER_SIZE];
        Self::new(count)?.write_to(&mut out);
        Ok(out)
    }

    /// Write this header into the first [`HEADER_SIZE`] bytes of `buf`
    #[inline]
    pub fn write_to(&self, buf: &mut [u8]) {
        WireOrder::write_u16(&mut buf[0..2], self.protocol);
        WireOrder::write_u16(&mut buf[2..4], self.count);
    }

    /// Decode a header from the front of `buf`.
    ///
    /// The protocol tag is not checked here; see [`PacketHeader::is_market_update`].
    pub fn decode(buf: &[u8]) -> ProtocolResult<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(ProtocolError::MalformedHeader {
                need: HEADER_SIZE,
                got: buf.len(),
            });
        }
        Ok(Self {
            protocol: WireOrder::read_u16(&buf[0..2]),
            count: WireOrder::read_u16(&buf[2..4]),
        })
    }

    /// True when the tag identifies a market update payload
    pub fn is_market_update(&self) -> bool {
        self.protocol == PROTOCOL_MARKET_UPDATE
    }

    /// Datagram length implied by this header
    pub fn datagram_len(&self) -> usize {
        crate::framed_len(self.count as usize)
    }
}
