//! Batch Generator
//!
//! Produces pseudo-random market updates stamped from a [`TimeSource`].
//! A batch shares one clock sample: record `i` carries `base + i`, so
//! timestamps are strictly increasing inside a batch. Across calls the base
//! never falls at or below the previous batch's last timestamp.

use crate::clock::{MonotonicClock, TimeSource};
use codec::{MarketUpdate, Side};
use generator_config::defaults::generation::{
    FRACTIONAL_SIZE_RANGE, INTEGER_SIZE_RANGE, PRICE_RANGE, RANDOM_COUNT_RANGE,
};
use generator_config::{GeneratorConfig, SizeProfile};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct BatchGenerator<C = MonotonicClock, R = StdRng> {
    clock: C,
    rng: R,
    size_profile: SizeProfile,
    last_timestamp: Option<u64>,
}

impl BatchGenerator<MonotonicClock, StdRng> {
    /// Generator wired to the process clock, seeded from the configuration
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(MonotonicClock::new(), config.size_profile, config.seed)
    }
}

impl<C: TimeSource> BatchGenerator<C, StdRng> {
    pub fn new(clock: C, size_profile: SizeProfile, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(clock, rng, size_profile)
    }
}

impl<C: TimeSource, R: Rng> BatchGenerator<C, R> {
    pub fn with_rng(clock: C, rng: R, size_profile: SizeProfile) -> Self {
        Self {
            clock,
            rng,
            size_profile,
            last_timestamp: None,
        }
    }

    pub fn size_profile(&self) -> SizeProfile {
        self.size_profile
    }

    /// A single record stamped now
    pub fn next_record(&mut self) -> MarketUpdate {
        let timestamp = self.reserve(1);
        self.random_record(timestamp)
    }

    /// `count` records with strictly increasing timestamps
    pub fn generate(&mut self, count: usize) -> Vec<MarketUpdate> {
        let mut records = Vec::with_capacity(count);
        self.generate_into(&mut records, count);
        records
    }

    /// Like [`BatchGenerator::generate`], reusing `out`'s allocation
    pub fn generate_into(&mut self, out: &mut Vec<MarketUpdate>, count: usize) {
        out.clear();
        if count == 0 {
            return;
        }
        out.reserve(count);
        let base = self.reserve(count);
        for i in 0..count as u64 {
            let record = self.random_record(base.saturating_add(i));
            out.push(record);
        }
    }

    /// Record count for a random-count datagram
    pub fn random_count(&mut self) -> usize {
        self.rng.gen_range(RANDOM_COUNT_RANGE)
    }

    /// Claim `count` consecutive timestamps and return the first
    fn reserve(&mut self, count: usize) -> u64 {
        let now = self.clock.now_ns();
        let base = match self.last_timestamp {
            Some(last) if now <= last => last.saturating_add(1),
            _ => now,
        };
        self.last_timestamp = Some(base.saturating_add(count as u64 - 1));
        base
    }

    fn random_record(&mut self, timestamp: u64) -> MarketUpdate {
        let price = self.rng.gen_range(PRICE_RANGE);
        let size = match self.size_profile {
            SizeProfile::Fractional => self.rng.gen_range(FRACTIONAL_SIZE_RANGE),
            SizeProfile::Integer => f64::from(self.rng.gen_range(INTEGER_SIZE_RANGE)),
        };
        let side = if self.rng.gen::<bool>() {
            Side::Bid
        } else {
            Side::Ask
        };
        MarketUpdate::new(timestamp, price, size, side)
    }
}
