//! Error types for slice composition.

use thiserror::Error;

/// Main error type for slice and injection operations.
///
/// Loader and updater failures never show up here: they are carried into
/// `meta.errors` of the slice that ran them.
#[derive(Debug, Error)]
pub enum RagsError {
    #[error("Injection path must contain at least one segment")]
    EmptyPath,

    #[error("Path conflict at {path}: {reason}")]
    PathConflict { path: String, reason: &'static str },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RagsError {
    fn from(e: serde_json::Error) -> Self {
        RagsError::Serialization(e.to_string())
    }
}

/// Result type for slice operations.
pub type Result<T> = std::result::Result<T, RagsError>;
