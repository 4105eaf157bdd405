//! # Generator Configuration
//!
//! Centralized configuration and defaults for the market data generator.
//!
//! ## Features
//!
//! - **Defaults**: destination, run size, rate and generation ranges
//! - **Configuration Bundle**: [`GeneratorConfig`] layered from defaults,
//!   TOML files and `MDGEN_*` environment variables
//!
//! ## Usage
//!
//! ```no_run
//! use generator_config::GeneratorConfig;
//!
//! let config = GeneratorConfig::load(None)?;
//! println!("sending to {}", config.destination());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod generator;

// Re-export commonly used types
pub use generator::{ConfigError, GeneratorConfig, PacingMode, SizeProfile};
