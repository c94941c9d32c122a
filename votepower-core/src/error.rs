//! Error taxonomy shared by the delegation and treasury engines.
//!
//! No variant here is fatal to a whole batch. Callers drop the unit of
//! work that produced the error (one record, one track, one chain) and keep
//! going with the rest.

/// Error types for the voting-power engines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed numeric input
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// An external query for one unit of work failed
    #[error("Fetch failed for {unit}: {reason}")]
    FetchFailure { unit: String, reason: String },

    /// Network has no document in the store
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// Document store error
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a fetch failure for a named unit.
    pub fn fetch(unit: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailure {
            unit: unit.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
