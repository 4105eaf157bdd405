//! Generator defaults
//!
//! Default values shared by the configuration loader, the CLI and the send
//! loop so every entry point starts from the same numbers.

/// Destination defaults
pub mod destination {
    /// Receiver host
    pub const HOST: &str = "127.0.0.1";

    /// Receiver UDP port (first port of the dynamic range)
    pub const PORT: u16 = 49152;

    /// Start of the IANA dynamic/private port range receivers listen in
    pub const DYNAMIC_PORT_START: u16 = 49152;
}

/// Run size and rate defaults
pub mod run {
    /// Packets sent before the run completes
    pub const TOTAL_PACKETS: u64 = 5_000_000;

    /// Target packets per second
    pub const TARGET_RATE: u64 = 1_000_000;

    /// Progress is reported every this many packets
    pub const REPORT_INTERVAL: u64 = 100_000;
}

/// Record generation defaults
pub mod generation {
    use std::ops::{Range, RangeInclusive};

    /// Price draw range
    pub const PRICE_RANGE: Range<f64> = 100.0..200.0;

    /// Size draw range under the fractional profile
    pub const FRACTIONAL_SIZE_RANGE: Range<f64> = 1.0..10.0;

    /// Size draw range under the integer profile
    pub const INTEGER_SIZE_RANGE: Range<u32> = 1..100;

    /// Records per datagram under random-count framing
    pub const RANDOM_COUNT_RANGE: RangeInclusive<usize> = 1..=20;
}

/// Prefix of environment variables that override file configuration
pub const ENV_PREFIX: &str = "MDGEN";
