//! Run statistics reporting
//!
//! The send loop never prints. It hands progress, send failures and the final
//! summary to a [`StatsSink`]; the binary plugs in [`TracingStatsSink`].

use generator_config::GeneratorConfig;
use network::TransportError;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Final counters of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub packets_sent: u64,
    pub send_errors: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Achieved packets per second
    pub fn effective_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.packets_sent as f64 / secs
        } else {
            0.0
        }
    }
}

/// Receives run statistics
pub trait StatsSink {
    fn on_start(&mut self, _config: &GeneratorConfig) {}

    /// Called every report interval with the running total
    fn on_progress(&mut self, packets_sent: u64, elapsed: Duration);

    /// Called once per failed send; the run continues
    fn on_send_error(&mut self, packets_sent: u64, error: &TransportError);

    fn on_summary(&mut self, summary: &RunSummary);
}

impl<T: StatsSink + ?Sized> StatsSink for &mut T {
    fn on_start(&mut self, config: &GeneratorConfig) {
        (**self).on_start(config)
    }

    fn on_progress(&mut self, packets_sent: u64, elapsed: Duration) {
        (**self).on_progress(packets_sent, elapsed)
    }

    fn on_send_error(&mut self, packets_sent: u64, error: &TransportError) {
        (**self).on_send_error(packets_sent, error)
    }

    fn on_summary(&mut self, summary: &RunSummary) {
        (**self).on_summary(summary)
    }
}

/// Logs statistics through `tracing`
#[derive(Debug, Default)]
pub struct TracingStatsSink;

impl StatsSink for TracingStatsSink {
    fn on_start(&mut self, config: &GeneratorConfig) {
        info!(
            destination = %config.destination(),
            total_packets = config.total_packets,
            target_rate = config.target_rate,
            framing = %config.framing,
            pacing = %config.pacing,
            wire_order = codec::wire_order_name(),
            "Starting market update stream"
        );
    }

    fn on_progress(&mut self, packets_sent: u64, elapsed: Duration) {
        info!(
            "Sent {} packets in {:.2}s",
            packets_sent,
            elapsed.as_secs_f64()
        );
    }

    fn on_send_error(&mut self, packets_sent: u64, error: &TransportError) {
        warn!(
            packet = packets_sent,
            category = error.category(),
            transient = error.is_transient(),
            "Send failed: {}",
            error
        );
    }

    fn on_summary(&mut self, summary: &RunSummary) {
        info!(
            outcome = %summary.outcome,
            send_errors = summary.send_errors,
            "Finished: {} packets in {:.2}s ({:.0} pkt/s)",
            summary.packets_sent,
            summary.elapsed.as_secs_f64(),
            summary.effective_rate()
        );
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryStatsSink {
    pub started: bool,
    pub progress: Vec<u64>,
    pub send_errors: Vec<(u64, String)>,
    pub summary: Option<RunSummary>,
}

impl StatsSink for MemoryStatsSink {
    fn on_start(&mut self, _config: &GeneratorConfig) {
        self.started = true;
    }

    fn on_progress(&mut self, packets_sent: u64, _elapsed: Duration) {
        self.progress.push(packets_sent);
    }

    fn on_send_error(&mut self, packets_sent: u64, error: &TransportError) {
        self.send_errors.push((packets_sent, error.to_string()));
    }

    fn on_summary(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_rate() {
        let summary = RunSummary {
            outcome: RunOutcome::Completed,
            packets_sent: 500,
            send_errors: 0,
            elapsed: Duration::from_millis(250),
        };
        assert!((summary.effective_rate() - 2_000.0).abs() < 1e-6);

        let instant = RunSummary {
            elapsed: Duration::ZERO,
            ..summary
        };
        assert_eq!(instant.effective_rate(), 0.0);
    }

    #[test]
    fn test_memory_sink_through_reference() {
        fn feed<K: StatsSink>(mut stats: K) {
            stats.on_start(&GeneratorConfig::default());
            stats.on_progress(100_000, Duration::from_secs(1));
            stats.on_send_error(7, &TransportError::send("refused"));
        }

        let mut sink = MemoryStatsSink::default();
        feed(&mut sink);
        assert!(sink.started);
        assert_eq!(sink.progress, vec![100_000]);
        assert_eq!(sink.send_errors.len(), 1);
        assert_eq!(sink.send_errors[0].0, 7);
    }
}
