//! Error types for the core crate.

use thiserror::Error;

/// Errors raised by core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A persisted session could not be interpreted.
    #[error("invalid session: {0}")]
    InvalidSession(String),
}

/// Convenience type alias for core results.
pub type Result<T> = std::result::Result<T, CoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
