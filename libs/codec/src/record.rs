//! Market update record encoding
//!
//! One record is a fixed [`RECORD_SIZE`]-byte value. Fields are written in
//! declared order using [`WireOrder`]; the trailing padding is always zeroed
//! so identical records always produce identical bytes.

use crate::constants::{RECORD_LIVE_SIZE, RECORD_SIZE, WireOrder};
use crate::error::{ProtocolError, ProtocolResult};
use byteorder::ByteOrder;
use serde::{Deserialize, Serialize};
use std::fmt;

const TIMESTAMP_OFFSET: usize = 0;
const PRICE_OFFSET: usize = 8;
const SIZE_OFFSET: usize = 16;
const SIDE_OFFSET: usize = 24;

/// Side of the book a market update applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Ask = 0,
    Bid = 1,
}

impl Side {
    /// Map a wire byte onto a side.
    ///
    /// Only the low bit is semantic; higher bits are ignored rather than
    /// rejected, matching how the reference framing treats the field.
    #[inline(always)]
    pub fn from_raw(raw: u8) -> Self {
        if raw & 1 == 0 {
            Side::Ask
        } else {
            Side::Bid
        }
    }

    #[inline(always)]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Ask => write!(f, "ASK"),
            Side::Bid => write!(f, "BID"),
        }
    }
}

/// A single synthetic market update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketUpdate {
    /// Nanoseconds since the Unix epoch
    pub timestamp: u64,
    pub price: f64,
    /// Strictly positive; integral values under the integer size profile
    pub size: f64,
    pub side: Side,
}

impl MarketUpdate {
    pub fn new(timestamp: u64, price: f64, size: f64, side: Side) -> Self {
        Self {
            timestamp,
            price,
            size,
            side,
        }
    }

    /// Encode into a fresh fixed-size array
    #[inline]
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        self.encode_into(&mut out);
        out
    }

    /// Encode into the first [`RECORD_SIZE`] bytes of `buf`, zeroing the padding.
    ///
    /// # Panics
    /// Panics if `buf` is shorter than [`RECORD_SIZE`]; callers size their
    /// buffers from the same constant.
    #[inline]
    pub fn encode_into(&self, buf: &mut [u8]) {
        write_fields(buf, self.timestamp, self.price, self.size, self.side.as_u8());
    }

    /// Decode a record from the front of `buf`.
    ///
    /// Trailing bytes beyond [`RECORD_SIZE`] and the padding bytes are not
    /// inspected.
    pub fn decode(buf: &[u8]) -> ProtocolResult<Self> {
        if buf.len() < RECORD_SIZE {
            return Err(ProtocolError::malformed_record(RECORD_SIZE, buf.len()));
        }

        Ok(Self {
            timestamp: WireOrder::read_u64(&buf[TIMESTAMP_OFFSET..PRICE_OFFSET]),
            price: WireOrder::read_f64(&buf[PRICE_OFFSET..SIZE_OFFSET]),
            size: WireOrder::read_f64(&buf[SIZE_OFFSET..SIDE_OFFSET]),
            side: Side::from_raw(buf[SIDE_OFFSET]),
        })
    }
}

/// Encode raw field values with a wide side value.
///
/// The side is truncated to its low byte and written verbatim, so a side of
/// `0x101` lands on the wire as `0x01`. Decoding then applies
/// [`Side::from_raw`].
pub fn encode_raw(timestamp: u64, price: f64, size: f64, side: u32) -> [u8; RECORD_SIZE] {
    let mut out = [0u8; RECORD_SIZE];
    write_fields(&mut out, timestamp, price, size, side as u8);
    out
}

#[inline(always)]
fn write_fields(buf: &mut [u8], timestamp: u64, price: f64, size: f64, side: u8) {
    let buf = &mut buf[..RECORD_SIZE];
    WireOrder::write_u64(&mut buf[TIMESTAMP_OFFSET..PRICE_OFFSET], timestamp);
    WireOrder::write_f64(&mut buf[PRICE_OFFSET..SIZE_OFFSET], price);
    WireOrder::write_f64(&mut buf[SIZE_OFFSET..SIDE_OFFSET], size);
    buf[SIDE_OFFSET] = side;
    buf[RECORD_LIVE_SIZE..].fill(0);
}
