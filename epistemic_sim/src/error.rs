//! Error types for the simulation harness.

use epistemic_core::EpistemicError;
use thiserror::Error;

/// Errors that abort a scenario or an export.
#[derive(Debug, Error)]
pub enum SimError {
    /// Ground truth could not be generated from the configuration
    #[error("Setup error: {0}")]
    Setup(String),

    /// A belief operation failed
    #[error("Epistemic error: {0}")]
    Epistemic(#[from] EpistemicError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    /// Creates a setup error.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }
}

pub type SimResult<T> = std::result::Result<T, SimError>;
