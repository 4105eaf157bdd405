//! # Market Update Codec
//!
//! ## Purpose
//!
//! Wire format rules for synthetic market-data traffic:
//! - Fixed-width market update records
//! - Optional packet header (protocol tag + record count)
//! - Datagram framing and the matching self-test parser
//! - Protocol constants and error types
//!
//! ## What This Crate Does NOT Contain
//! - Socket management (belongs in `network`)
//! - Record generation or pacing (belongs in the generator service)
//!
//! ## Byte Order
//!
//! Every multi-byte field uses [`WireOrder`], fixed at build time.
//! Little-endian by default; the `big-endian` feature switches the whole
//! format to network order. There is no runtime negotiation.
//!
//! ## Framing Invariant
//!
//! A framed datagram is always exactly `HEADER_SIZE + count * RECORD_SIZE`
//! bytes. Receivers rely on this to frame records without per-record lengths.

pub mod constants;
pub mod error;
pub mod header;
pub mod packet;
pub mod record;

pub use constants::*;
pub use error::{ProtocolError, ProtocolResult};
pub use header::PacketHeader;
pub use packet::{parse_framed, parse_unframed, Framing, PacketBuilder};
pub use record::{encode_raw, MarketUpdate, Side};
