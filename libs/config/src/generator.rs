//! Generator Configuration Module
//!
//! The configuration bundle for one generator run. Values are layered:
//! built-in defaults, then an optional TOML file, then `MDGEN_*` environment
//! variables. The CLI applies its flags on top of the loaded bundle.

use crate::defaults;
use anyhow::{Context, Result};
use codec::Framing;
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// How packets are paced onto the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// One record per datagram, spaced `1 / target_rate` apart
    #[default]
    PerPacket,
    /// Up to `target_rate` datagrams back-to-back per one-second window
    Batch,
    /// Framed datagrams with a random record count, per-packet spacing
    RandomCount,
}

impl fmt::Display for PacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacingMode::PerPacket => write!(f, "per_packet"),
            PacingMode::Batch => write!(f, "batch"),
            PacingMode::RandomCount => write!(f, "random_count"),
        }
    }
}

/// Distribution used for the record `size` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeProfile {
    /// Uniform `f64` in `[1.0, 10.0)`
    #[default]
    Fractional,
    /// Uniform integer in `[1, 100)`, carried as `f64`
    Integer,
}

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target_rate must be at least 1 packet per second")]
    ZeroRate,

    #[error("total_packets must be at least 1")]
    ZeroTotal,

    #[error("host must not be empty")]
    EmptyHost,

    #[error("random_count pacing needs framed datagrams: the record count travels in the header")]
    RandomCountUnframed,

    #[error("batch and random_count pacing are mutually exclusive")]
    ConflictingPacing,

    #[error("Invalid configuration: {0}")]
    Parse(String),
}

/// Configuration bundle for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub host: String,
    pub port: u16,
    pub total_packets: u64,
    /// Packets per second
    pub target_rate: u64,
    pub framing: Framing,
    pub pacing: PacingMode,
    pub size_profile: SizeProfile,
    /// Fixed RNG seed for reproducible runs; entropy when absent
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            host: defaults::destination::HOST.to_string(),
            port: defaults::destination::PORT,
            total_packets: defaults::run::TOTAL_PACKETS,
            target_rate: defaults::run::TARGET_RATE,
            framing: Framing::Unframed,
            pacing: PacingMode::PerPacket,
            size_profile: SizeProfile::Fractional,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from an optional TOML file with `MDGEN_*`
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env_prefix(path, defaults::ENV_PREFIX)
    }

    /// Same as [`GeneratorConfig::load`] with a custom environment prefix
    pub fn load_with_env_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let base = Config::try_from(&Self::default())
            .context("Failed to serialize default configuration")?;
        let mut builder = Config::builder().add_source(base);

        if let Some(path) = path {
            info!("Loading generator config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // MDGEN_TOTAL_PACKETS=10 → total_packets = 10
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate an inline TOML document
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the bundle can drive a run
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.target_rate == 0 {
            return Err(ConfigError::ZeroRate);
        }
        if self.total_packets == 0 {
            return Err(ConfigError::ZeroTotal);
        }
        if self.pacing == PacingMode::RandomCount && self.framing == Framing::Unframed {
            return Err(ConfigError::RandomCountUnframed);
        }
        if self.port < defaults::destination::DYNAMIC_PORT_START {
            warn!(
                "Port {} is below {}; receivers listen in the dynamic range",
                self.port,
                defaults::destination::DYNAMIC_PORT_START
            );
        }
        Ok(())
    }

    /// Map the legacy `batch` / `random_count` switches onto a pacing mode
    pub fn pacing_from_flags(
        batch: bool,
        random_count: bool,
    ) -> std::result::Result<PacingMode, ConfigError> {
        match (batch, random_count) {
            (true, true) => Err(ConfigError::ConflictingPacing),
            (true, false) => Ok(PacingMode::Batch),
            (false, true) => Ok(PacingMode::RandomCount),
            (false, false) => Ok(PacingMode::PerPacket),
        }
    }

    /// `host:port`, bracketing IPv6 literals
    pub fn destination(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
