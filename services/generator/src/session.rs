//! Session Controller
//!
//! Owns the state of one run: counters, the start instant and the
//! cancellation flag. The flag is the only value shared across threads; the
//! interrupt path sets it and the send loop polls it.

use crate::batch::BatchGenerator;
use crate::clock::TimeSource;
use crate::error::Result;
use crate::pacing::PacingSender;
use crate::stats::{RunSummary, StatsSink};
use generator_config::GeneratorConfig;
use network::{DatagramSink, UdpConfig, UdpSender};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Cooperative cancellation flag. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent and safe from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Counters for one run. Never reset mid-run.
#[derive(Debug, Default)]
pub struct SessionState {
    packets_sent: u64,
    send_errors: u64,
    run_start: Option<Instant>,
    cancel: CancellationToken,
}

impl SessionState {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn send_errors(&self) -> u64 {
        self.send_errors
    }

    pub fn run_start(&self) -> Option<Instant> {
        self.run_start
    }

    /// Time since the run started, zero before it has
    pub fn elapsed(&self) -> Duration {
        self.run_start.map(|s| s.elapsed()).unwrap_or_default()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn mark_started(&mut self) {
        if self.run_start.is_none() {
            self.run_start = Some(Instant::now());
        }
    }

    pub(crate) fn record_send(&mut self) {
        self.packets_sent += 1;
    }

    pub(crate) fn record_error(&mut self) {
        self.send_errors += 1;
    }
}

/// Runs one generator session against a destination
pub struct SessionController<K> {
    config: GeneratorConfig,
    stats: K,
    cancel: CancellationToken,
}

impl<K: StatsSink> SessionController<K> {
    /// Validate the configuration and prepare a session
    pub fn new(config: GeneratorConfig, stats: K) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats,
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Token that stops the run at its next checkpoint
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> &K {
        &self.stats
    }

    /// Open a UDP sender to the configured destination and run to completion
    /// or cancellation. Blocks the calling thread.
    pub fn run(&mut self) -> Result<RunSummary> {
        let sender = UdpSender::connect(self.config.destination(), UdpConfig::default())?;
        self.run_with_sink(sender)
    }

    /// Run against any datagram sink
    pub fn run_with_sink<S: DatagramSink>(&mut self, sink: S) -> Result<RunSummary> {
        let generator = BatchGenerator::from_config(&self.config);
        self.run_with(sink, generator)
    }

    /// Run with an explicit generator, e.g. one driven by a replay clock
    pub fn run_with<S, C, R>(
        &mut self,
        sink: S,
        generator: BatchGenerator<C, R>,
    ) -> Result<RunSummary>
    where
        S: DatagramSink,
        C: TimeSource,
        R: Rng,
    {
        self.stats.on_start(&self.config);

        let mut session = SessionState::new(self.cancel.clone());
        let mut sender = PacingSender::new(&self.config, generator, sink);
        let summary = sender.run(&mut session, &mut self.stats)?;

        if summary.packets_sent < self.config.total_packets {
            info!(
                "Run {} after {} of {} packets",
                summary.outcome, summary.packets_sent, self.config.total_packets
            );
        }
        Ok(summary)
    }
}
