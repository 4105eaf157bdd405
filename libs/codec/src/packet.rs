//! Datagram framing
//!
//! Turns records into datagram payloads and back. The builder owns one
//! reusable buffer, so steady-state framing performs no allocation.

use crate::constants::{framed_len, HEADER_SIZE, MAX_RECORDS_PER_DATAGRAM, MAX_UDP_PAYLOAD, RECORD_SIZE};
use crate::error::{ProtocolError, ProtocolResult};
use crate::header::PacketHeader;
use crate::record::MarketUpdate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether datagrams carry a packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// One bare record per datagram
    #[default]
    Unframed,
    /// Header followed by one or more records
    Framed,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Unframed => write!(f, "unframed"),
            Framing::Framed => write!(f, "framed"),
        }
    }
}

/// Builds datagram payloads into a reusable buffer
#[derive(Debug)]
pub struct PacketBuilder {
    framing: Framing,
    buffer: Vec<u8>,
}

impl PacketBuilder {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            buffer: Vec::with_capacity(framed_len(1)),
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Build a datagram carrying exactly one record. Never fails.
    #[inline]
    pub fn build_single(&mut self, record: &MarketUpdate) -> &[u8] {
        match self.framing {
            Framing::Unframed => {
                self.buffer.resize(RECORD_SIZE, 0);
                record.encode_into(&mut self.buffer);
            }
            Framing::Framed => {
                self.buffer.resize(framed_len(1), 0);
                PacketHeader {
                    protocol: crate::PROTOCOL_MARKET_UPDATE,
                    count: 1,
                }
                .write_to(&mut self.buffer);
                record.encode_into(&mut self.buffer[HEADER_SIZE..]);
            }
        }
        &self.buffer
    }

    /// Build a datagram carrying all of `records`.
    ///
    /// Unframed datagrams hold exactly one record. Framed datagrams hold up to
    /// [`MAX_RECORDS_PER_DATAGRAM`] so the payload fits a single UDP datagram.
    pub fn build(&mut self, records: &[MarketUpdate]) -> ProtocolResult<&[u8]> {
        match self.framing {
            Framing::Unframed => {
                if records.len() != 1 {
                    return Err(ProtocolError::InvalidCount {
                        count: records.len(),
                        min: 1,
                        max: 1,
                    });
                }
                Ok(self.build_single(&records[0]))
            }
            Framing::Framed => {
                if records.len() > MAX_RECORDS_PER_DATAGRAM {
                    return Err(ProtocolError::PacketTooLarge {
                        records: records.len(),
                        size: framed_len(records.len()),
                        limit: MAX_UDP_PAYLOAD,
                    });
                }
                let header = PacketHeader::new(records.len())?;

                self.buffer.resize(framed_len(records.len()), 0);
                header.write_to(&mut self.buffer);
                for (record, chunk) in records
                    .iter()
                    .zip(self.buffer[HEADER_SIZE..].chunks_exact_mut(RECORD_SIZE))
                {
                    record.encode_into(chunk);
                }
                Ok(&self.buffer)
            }
        }
    }
}

/// Parse a framed datagram, applying the same checks a receiver does:
/// the tag must be the market update tag and the length must equal
/// `HEADER_SIZE + count * RECORD_SIZE`.
pub fn parse_framed(datagram: &[u8]) -> ProtocolResult<(PacketHeader, Vec<MarketUpdate>)> {
    let header = PacketHeader::decode(datagram)?;
    if !header.is_market_update() {
        return Err(ProtocolError::UnknownProtocol {
            expected: crate::PROTOCOL_MARKET_UPDATE,
            actual: header.protocol,
        });
    }

    let expected = header.datagram_len();
    if header.count == 0 || datagram.len() != expected {
        return Err(ProtocolError::LengthMismatch {
            count: header.count,
            expected,
            actual: datagram.len(),
        });
    }

    let records = datagram[HEADER_SIZE..]
        .chunks_exact(RECORD_SIZE)
        .map(MarketUpdate::decode)
        .collect::<ProtocolResult<Vec<_>>>()?;
    Ok((header, records))
}

/// Parse an unframed datagram, which must be exactly one record
pub fn parse_unframed(datagram: &[u8]) -> ProtocolResult<MarketUpdate> {
    if datagram.len() != RECORD_SIZE {
        return Err(ProtocolError::malformed_record(RECORD_SIZE, datagram.len()));
    }
    MarketUpdate::decode(datagram)
}
