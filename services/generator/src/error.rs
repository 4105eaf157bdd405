//! Error types for the generator service

use crate::pacing::SenderState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] generator_config::ConfigError),

    #[error("Codec error: {0}")]
    Codec(#[from] codec::ProtocolError),

    #[error("Transport error: {0}")]
    Transport(#[from] network::TransportError),

    #[error("Sender cannot start from state {state:?}")]
    InvalidState { state: SenderState },
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
