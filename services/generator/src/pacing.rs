//! Pacing Sender
//!
//! Drives the send loop for one run. Three strategies share the same
//! accounting and cancellation checkpoints:
//!
//! - **Per-packet**: one record per datagram, one datagram every
//!   `1 / target_rate` seconds. The cycle start is captured before the
//!   record is built, and a late cycle is not caught up.
//! - **Batch**: one-second windows of up to `target_rate` single-record
//!   datagrams sent back-to-back, then the rest of the window is slept away.
//!   Records are generated ahead in chunks of at most `BATCH_CHUNK`, so
//!   memory stays flat whatever the rate.
//! - **Random count**: framed datagrams of 1..=20 records at per-packet
//!   spacing. Each datagram counts as one packet.
//!
//! Cancellation is observed at the top of every iteration and around every
//! sleep. No sleep follows the final packet.

use crate::batch::BatchGenerator;
use crate::clock::{MonotonicClock, TimeSource};
use crate::error::{GeneratorError, Result};
use crate::session::SessionState;
use crate::stats::{RunOutcome, RunSummary, StatsSink};
use codec::{MarketUpdate, PacketBuilder};
use generator_config::defaults::run::REPORT_INTERVAL;
use generator_config::{GeneratorConfig, PacingMode};
use network::DatagramSink;
use rand::rngs::StdRng;
use rand::Rng;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const BATCH_WINDOW: Duration = Duration::from_secs(1);

/// Records generated ahead per step inside a batch window
const BATCH_CHUNK: u64 = 65_536;

/// Lifecycle of a sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    Running,
    Cancelled,
    Completed,
    /// Aborted by an error that is not a send failure
    Failed,
}

pub struct PacingSender<S, C = MonotonicClock, R = StdRng> {
    sink: S,
    generator: BatchGenerator<C, R>,
    builder: PacketBuilder,
    pacing: PacingMode,
    total_packets: u64,
    target_rate: u64,
    interval: Duration,
    report_interval: u64,
    state: SenderState,
    scratch: Vec<MarketUpdate>,
}

impl<S, C, R> PacingSender<S, C, R>
where
    S: DatagramSink,
    C: TimeSource,
    R: Rng,
{
    pub fn new(config: &GeneratorConfig, generator: BatchGenerator<C, R>, sink: S) -> Self {
        let target_rate = config.target_rate.max(1);
        Self {
            sink,
            generator,
            builder: PacketBuilder::new(config.framing),
            pacing: config.pacing,
            total_packets: config.total_packets,
            target_rate,
            interval: Duration::from_nanos(1_000_000_000 / target_rate),
            report_interval: REPORT_INTERVAL,
            state: SenderState::Idle,
            scratch: Vec::new(),
        }
    }

    /// Report progress every `packets` sends instead of the default
    pub fn with_report_interval(mut self, packets: u64) -> Self {
        self.report_interval = packets.max(1);
        self
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Per-packet spacing
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Send until `total_packets` have been issued or the session is cancelled
    pub fn run<K: StatsSink>(
        &mut self,
        session: &mut SessionState,
        stats: &mut K,
    ) -> Result<RunSummary> {
        if self.state != SenderState::Idle {
            return Err(GeneratorError::InvalidState { state: self.state });
        }
        self.state = SenderState::Running;
        session.mark_started();
        debug!(
            "Pacing {} packets at {} pkt/s ({})",
            self.total_packets, self.target_rate, self.pacing
        );

        let result = match self.pacing {
            PacingMode::PerPacket => self.run_per_packet(session, stats),
            PacingMode::Batch => self.run_batch(session, stats),
            PacingMode::RandomCount => self.run_random_count(session, stats),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = SenderState::Failed;
                return Err(e);
            }
        };
        self.state = match outcome {
            RunOutcome::Completed => SenderState::Completed,
            RunOutcome::Cancelled => SenderState::Cancelled,
        };

        let summary = RunSummary {
            outcome,
            packets_sent: session.packets_sent(),
            send_errors: session.send_errors(),
            elapsed: session.elapsed(),
        };
        stats.on_summary(&summary);
        Ok(summary)
    }

    fn run_per_packet<K: StatsSink>(
        &mut self,
        session: &mut SessionState,
        stats: &mut K,
    ) -> Result<RunOutcome> {
        while session.packets_sent() < self.total_packets {
            if session.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }
            let cycle_start = Instant::now();

            let record = self.generator.next_record();
            let result = self.sink.send_datagram(self.builder.build_single(&record));
            account(result, session, stats, self.report_interval);

            if session.packets_sent() >= self.total_packets {
                break;
            }
            if pace(cycle_start, self.interval, session) {
                return Ok(RunOutcome::Cancelled);
            }
        }
        Ok(RunOutcome::Completed)
    }

    fn run_batch<K: StatsSink>(
        &mut self,
        session: &mut SessionState,
        stats: &mut K,
    ) -> Result<RunOutcome> {
        while session.packets_sent() < self.total_packets {
            if session.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }
            let window_start = Instant::now();

            let remaining = self.total_packets - session.packets_sent();
            let mut window_left = remaining.min(self.target_rate);
            let mut first = true;

            while window_left > 0 {
                let chunk = window_left.min(BATCH_CHUNK) as usize;
                self.generator.generate_into(&mut self.scratch, chunk);
                window_left -= chunk as u64;

                for record in &self.scratch {
                    if !first && session.is_cancelled() {
                        return Ok(RunOutcome::Cancelled);
                    }
                    first = false;
                    let result = self.sink.send_datagram(self.builder.build_single(record));
                    account(result, session, stats, self.report_interval);
                }
            }

            if session.packets_sent() >= self.total_packets {
                break;
            }
            if pace(window_start, BATCH_WINDOW, session) {
                return Ok(RunOutcome::Cancelled);
            }
        }
        Ok(RunOutcome::Completed)
    }

    fn run_random_count<K: StatsSink>(
        &mut self,
        session: &mut SessionState,
        stats: &mut K,
    ) -> Result<RunOutcome> {
        while session.packets_sent() < self.total_packets {
            if session.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }
            let cycle_start = Instant::now();

            let count = self.generator.random_count();
            self.generator.generate_into(&mut self.scratch, count);
            let datagram = self.builder.build(&self.scratch)?;
            let result = self.sink.send_datagram(datagram);
            account(result, session, stats, self.report_interval);

            if session.packets_sent() >= self.total_packets {
                break;
            }
            if pace(cycle_start, self.interval, session) {
                return Ok(RunOutcome::Cancelled);
            }
        }
        Ok(RunOutcome::Completed)
    }
}

/// Count one issued send and forward failures and progress to the stats sink
fn account<K: StatsSink>(
    result: network::Result<usize>,
    session: &mut SessionState,
    stats: &mut K,
    report_interval: u64,
) {
    session.record_send();
    if let Err(e) = result {
        session.record_error();
        stats.on_send_error(session.packets_sent(), &e);
    }
    if session.packets_sent() % report_interval == 0 {
        stats.on_progress(session.packets_sent(), session.elapsed());
    }
}

/// Sleep out the rest of `period` measured from `cycle_start`.
///
/// Returns true when cancellation was observed before or after the sleep.
/// Overrun cycles return immediately.
fn pace(cycle_start: Instant, period: Duration, session: &SessionState) -> bool {
    let elapsed = cycle_start.elapsed();
    if elapsed >= period {
        return false;
    }
    if session.is_cancelled() {
        return true;
    }
    thread::sleep(period - elapsed);
    session.is_cancelled()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::CancellationToken;
    use crate::stats::MemoryStatsSink;
    use codec::{parse_framed, parse_unframed, Framing, RECORD_SIZE};
    use generator_config::SizeProfile;
    use network::TransportError;

    #[derive(Default)]
    struct CaptureSink {
        datagrams: Vec<Vec<u8>>,
        sent_at: Vec<Instant>,
    }

    impl DatagramSink for CaptureSink {
        fn send_datagram(&mut self, datagram: &[u8]) -> network::Result<usize> {
            self.datagrams.push(datagram.to_vec());
            self.sent_at.push(Instant::now());
            Ok(datagram.len())
        }
    }

    /// Fails every send whose 1-based index is listed
    struct FlakySink {
        fail_on: Vec<usize>,
        calls: usize,
    }

    impl DatagramSink for FlakySink {
        fn send_datagram(&mut self, datagram: &[u8]) -> network::Result<usize> {
            self.calls += 1;
            if self.fail_on.contains(&self.calls) {
                Err(TransportError::send("no buffer space"))
            } else {
                Ok(datagram.len())
            }
        }
    }

    /// Flips the token once `after` datagrams went out
    struct CancelAfter {
        token: CancellationToken,
        after: usize,
        calls: usize,
    }

    impl DatagramSink for CancelAfter {
        fn send_datagram(&mut self, datagram: &[u8]) -> network::Result<usize> {
            self.calls += 1;
            if self.calls == self.after {
                self.token.cancel();
            }
            Ok(datagram.len())
        }
    }

    /// Stalls inside one send, recording when every send started
    struct SlowSink {
        stall_on: usize,
        stall: Duration,
        sent_at: Vec<Instant>,
    }

    impl SlowSink {
        fn new(stall_on: usize, stall: Duration) -> Self {
            Self {
                stall_on,
                stall,
                sent_at: Vec::new(),
            }
        }
    }

    impl DatagramSink for SlowSink {
        fn send_datagram(&mut self, datagram: &[u8]) -> network::Result<usize> {
            self.sent_at.push(Instant::now());
            if self.sent_at.len() == self.stall_on {
                thread::sleep(self.stall);
            }
            Ok(datagram.len())
        }
    }

    fn config(total: u64, rate: u64, framing: Framing, pacing: PacingMode) -> GeneratorConfig {
        GeneratorConfig {
            total_packets: total,
            target_rate: rate,
            framing,
            pacing,
            seed: Some(1),
            ..GeneratorConfig::default()
        }
    }

    fn generator(clock: &ManualClock) -> BatchGenerator<&ManualClock> {
        BatchGenerator::new(clock, SizeProfile::Fractional, Some(1))
    }

    #[test]
    fn test_per_packet_sends_exact_total() {
        let clock = ManualClock::new(1);
        let cfg = config(5, 1_000_000, Framing::Unframed, PacingMode::PerPacket);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default());
        let mut session = SessionState::default();
        let mut stats = MemoryStatsSink::default();

        let summary = sender.run(&mut session, &mut stats).unwrap();
        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.packets_sent, 5);
        assert_eq!(sender.state(), SenderState::Completed);
        assert_eq!(stats.summary, Some(summary));

        let sink = sender.into_sink();
        assert_eq!(sink.datagrams.len(), 5);
        let stamps: Vec<u64> = sink
            .datagrams
            .iter()
            .map(|d| {
                assert_eq!(d.len(), RECORD_SIZE);
                parse_unframed(d).unwrap().timestamp
            })
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_per_packet_spacing_lower_bound() {
        let clock = ManualClock::new(1);
        let cfg = config(20, 1_000, Framing::Unframed, PacingMode::PerPacket);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default());
        assert_eq!(sender.interval(), Duration::from_millis(1));

        let started = Instant::now();
        sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(19));

        let sink = sender.into_sink();
        let first = sink.sent_at[0];
        let last = *sink.sent_at.last().unwrap();
        assert!(last - first >= Duration::from_millis(19));
    }

    #[test]
    fn test_single_packet_run_does_not_sleep() {
        let clock = ManualClock::new(1);
        let cfg = config(1, 1, Framing::Unframed, PacingMode::PerPacket);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default());

        let started = Instant::now();
        let summary = sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap();
        assert_eq!(summary.packets_sent, 1);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_random_count_datagrams_are_framed() {
        let clock = ManualClock::new(1);
        let cfg = config(50, 1_000_000, Framing::Framed, PacingMode::RandomCount);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default());

        let summary = sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap();
        assert_eq!(summary.packets_sent, 50);

        for datagram in &sender.sink().datagrams {
            let (header, records) = parse_framed(datagram).unwrap();
            assert!((1..=20).contains(&header.count));
            assert_eq!(records.len(), header.count as usize);
        }
    }

    #[test]
    fn test_random_count_unframed_is_codec_error() {
        let clock = ManualClock::new(1);
        let cfg = config(10, 1_000_000, Framing::Unframed, PacingMode::RandomCount);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default());

        // Ten single-record draws in a row would be needed to avoid a
        // multi-record datagram; unframed datagrams carry exactly one.
        let err = sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Codec(_)));
        assert_eq!(sender.state(), SenderState::Failed);
    }

    #[test]
    fn test_per_packet_overrun_is_not_caught_up() {
        let clock = ManualClock::new(1);
        let cfg = config(8, 1_000, Framing::Unframed, PacingMode::PerPacket);
        let sink = SlowSink::new(3, Duration::from_millis(10));
        let mut sender = PacingSender::new(&cfg, generator(&clock), sink);

        sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap();
        let sent_at = &sender.sink().sent_at;
        assert_eq!(sent_at.len(), 8);

        // The stalled cycle overran, so the next send follows at once.
        assert!(sent_at[3] - sent_at[2] >= Duration::from_millis(10));
        // Every later cycle still waits a full interval.
        for pair in sent_at[3..].windows(2) {
            assert!(
                pair[1] - pair[0] >= Duration::from_micros(900),
                "burst after overrun: gap {:?}",
                pair[1] - pair[0]
            );
        }
    }

    #[test]
    fn test_batch_overrun_window_is_not_caught_up() {
        let clock = ManualClock::new(1);
        let cfg = config(9, 3, Framing::Unframed, PacingMode::Batch);
        let sink = SlowSink::new(1, Duration::from_millis(1_100));
        let mut sender = PacingSender::new(&cfg, generator(&clock), sink);

        sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap();
        let sent_at = &sender.sink().sent_at;
        assert_eq!(sent_at.len(), 9);

        // First window overran: the second starts right away with a normal
        // window's worth of packets, not a double batch.
        assert!(sent_at[3] - sent_at[0] >= Duration::from_millis(1_100));
        assert!(sent_at[3] - sent_at[0] < Duration::from_millis(1_500));
        // The third window still waits out the second one in full.
        assert!(sent_at[6] - sent_at[3] >= Duration::from_millis(990));
    }

    #[test]
    fn test_batch_huge_rate_keeps_buffer_bounded() {
        let clock = ManualClock::new(1);
        let token = CancellationToken::new();
        let cfg = config(1 << 60, 1 << 60, Framing::Unframed, PacingMode::Batch);
        assert!(cfg.validate().is_ok());
        let sink = CancelAfter {
            token: token.clone(),
            after: 5,
            calls: 0,
        };
        let mut sender = PacingSender::new(&cfg, generator(&clock), sink);

        let summary = sender
            .run(&mut SessionState::new(token), &mut MemoryStatsSink::default())
            .unwrap();
        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.packets_sent, 5);
        assert!(sender.scratch.capacity() <= 2 * BATCH_CHUNK as usize);
    }

    #[test]
    fn test_batch_window_spans_several_chunks() {
        let clock = ManualClock::new(1);
        let total = BATCH_CHUNK * 2 + 7;
        let cfg = config(total, total, Framing::Unframed, PacingMode::Batch);
        let mut sender = PacingSender::new(&cfg, generator(&clock), SlowSink::new(0, Duration::ZERO));

        let summary = sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap();
        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.packets_sent, total);
        assert_eq!(sender.sink().sent_at.len() as u64, total);
    }

    #[test]
    fn test_batch_window_sends_back_to_back() {
        let clock = ManualClock::new(1);
        let cfg = config(250, 1_000, Framing::Unframed, PacingMode::Batch);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default());

        let started = Instant::now();
        let summary = sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap();
        // Whole run fits in the first window, so no sleep at all.
        assert!(started.elapsed() < Duration::from_millis(900));
        assert_eq!(summary.packets_sent, 250);
        assert!(sender
            .sink()
            .datagrams
            .iter()
            .all(|d| d.len() == RECORD_SIZE));
    }

    #[test]
    fn test_batch_second_window_waits() {
        let clock = ManualClock::new(1);
        let cfg = config(6, 4, Framing::Unframed, PacingMode::Batch);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default());

        sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap();
        let sent_at = &sender.sink().sent_at;
        assert_eq!(sent_at.len(), 6);
        assert!(sent_at[4] - sent_at[0] >= Duration::from_millis(990));
        assert!(sent_at[3] - sent_at[0] < Duration::from_millis(500));
    }

    #[test]
    fn test_send_failures_are_counted_and_run_continues() {
        let clock = ManualClock::new(1);
        let cfg = config(10, 1_000_000, Framing::Unframed, PacingMode::PerPacket);
        let sink = FlakySink {
            fail_on: vec![2, 5],
            calls: 0,
        };
        let mut sender = PacingSender::new(&cfg, generator(&clock), sink);
        let mut stats = MemoryStatsSink::default();

        let summary = sender.run(&mut SessionState::default(), &mut stats).unwrap();
        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.packets_sent, 10);
        assert_eq!(summary.send_errors, 2);
        let reported: Vec<u64> = stats.send_errors.iter().map(|(n, _)| *n).collect();
        assert_eq!(reported, vec![2, 5]);
    }

    #[test]
    fn test_cancel_stops_after_current_packet() {
        let clock = ManualClock::new(1);
        let token = CancellationToken::new();
        let cfg = config(1_000_000, 1_000_000, Framing::Unframed, PacingMode::PerPacket);
        let sink = CancelAfter {
            token: token.clone(),
            after: 2,
            calls: 0,
        };
        let mut sender = PacingSender::new(&cfg, generator(&clock), sink);
        let mut session = SessionState::new(token);

        let summary = sender
            .run(&mut session, &mut MemoryStatsSink::default())
            .unwrap();
        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.packets_sent, 2);
        assert_eq!(sender.state(), SenderState::Cancelled);
    }

    #[test]
    fn test_cancel_inside_batch_window() {
        let clock = ManualClock::new(1);
        let token = CancellationToken::new();
        let cfg = config(100, 100, Framing::Unframed, PacingMode::Batch);
        let sink = CancelAfter {
            token: token.clone(),
            after: 3,
            calls: 0,
        };
        let mut sender = PacingSender::new(&cfg, generator(&clock), sink);

        let summary = sender
            .run(&mut SessionState::new(token), &mut MemoryStatsSink::default())
            .unwrap();
        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.packets_sent, 3);
    }

    #[test]
    fn test_cancelled_before_start_sends_nothing() {
        let clock = ManualClock::new(1);
        let token = CancellationToken::new();
        token.cancel();
        let cfg = config(10, 1_000, Framing::Unframed, PacingMode::PerPacket);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default());

        let summary = sender
            .run(&mut SessionState::new(token), &mut MemoryStatsSink::default())
            .unwrap();
        assert_eq!(summary.packets_sent, 0);
        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert!(sender.sink().datagrams.is_empty());
    }

    #[test]
    fn test_progress_reported_at_interval() {
        let clock = ManualClock::new(1);
        let cfg = config(25, 1_000_000, Framing::Unframed, PacingMode::PerPacket);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default())
            .with_report_interval(10);
        let mut stats = MemoryStatsSink::default();

        sender.run(&mut SessionState::default(), &mut stats).unwrap();
        assert_eq!(stats.progress, vec![10, 20]);
        assert_eq!(stats.summary.map(|s| s.packets_sent), Some(25));
    }

    #[test]
    fn test_sender_runs_once() {
        let clock = ManualClock::new(1);
        let cfg = config(1, 1_000, Framing::Unframed, PacingMode::PerPacket);
        let mut sender = PacingSender::new(&cfg, generator(&clock), CaptureSink::default());
        sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap();

        let err = sender
            .run(&mut SessionState::default(), &mut MemoryStatsSink::default())
            .unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::InvalidState {
                state: SenderState::Completed
            }
        ));
    }
}
