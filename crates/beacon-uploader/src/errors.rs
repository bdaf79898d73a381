//! Error types for the uploader.
//!
//! Upload failures are not errors: a [`crate::Transport`] reports them as
//! `false` and the entries stay queued. These variants cover local storage
//! failures during a pass and worker lifecycle problems.

use thiserror::Error;

/// Errors that can occur while processing or submitting.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Reading or deleting queue entries, or persisting the sequence id, failed.
    #[error("store error: {0}")]
    Store(#[from] beacon_store::StoreError),

    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The submit worker has exited.
    #[error("submit worker closed: {0}")]
    WorkerClosed(String),
}

/// Convenience type alias for uploader results.
pub type Result<T> = std::result::Result<T, UploadError>;
