//! # Market Update Generator
//!
//! Streams synthetic market updates to a UDP receiver at a target rate.
//!
//! ## Components
//!
//! - [`BatchGenerator`]: random records with monotonic timestamps
//! - [`PacingSender`]: per-packet, batch and random-count send loops
//! - [`SessionController`]: one run, its counters and its cancellation token
//! - [`StatsSink`]: where progress and the final summary go
//!
//! ## Usage
//!
//! ```no_run
//! use generator_config::GeneratorConfig;
//! use market_generator::{SessionController, TracingStatsSink};
//!
//! let mut controller = SessionController::new(GeneratorConfig::default(), TracingStatsSink)?;
//! let summary = controller.run()?;
//! println!("{} packets sent", summary.packets_sent);
//! # Ok::<(), market_generator::GeneratorError>(())
//! ```

pub mod batch;
pub mod clock;
pub mod error;
pub mod pacing;
pub mod session;
pub mod stats;

pub use batch::BatchGenerator;
pub use clock::{ManualClock, MonotonicClock, TimeSource};
pub use error::{GeneratorError, Result};
pub use pacing::{PacingSender, SenderState};
pub use session::{CancellationToken, SessionController, SessionState};
pub use stats::{MemoryStatsSink, RunOutcome, RunSummary, StatsSink, TracingStatsSink};
