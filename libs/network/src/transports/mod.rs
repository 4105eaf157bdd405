//! Datagram Transport Layer
//!
//! The generator writes through [`DatagramSink`], so the send loop never
//! depends on a concrete socket. [`UdpSender`] is the production sink.

use crate::Result;

pub mod udp;


pub use udp::{UdpConfig, UdpSender, UdpStats};

/// Fire-and-forget datagram destination
///
/// One call sends one datagram. There is no acknowledgement and no retry;
/// an `Err` means this datagram was not handed to the network.
pub trait DatagramSink {
    /// Send one datagram, returning the number of bytes written
    fn send_datagram(&mut self, datagram: &[u8]) -> Result<usize>;
}

impl<T: DatagramSink + ?Sized> DatagramSink for &mut T {
    fn send_datagram(&mut self, datagram: &[u8]) -> Result<usize> {
        (**self).send_datagram(datagram)
    }
}

impl<T: DatagramSink + ?Sized> DatagramSink for Box<T> {
    fn send_datagram(&mut self, datagram: &[u8]) -> Result<usize> {
        (**self).send_datagram(datagram)
    }
}
