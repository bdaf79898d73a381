//! Error types for the client facade.

use thiserror::Error;

/// Errors surfaced by [`crate::AnalyticsClient`].
///
/// Validation problems never appear here: they become diagnostic events.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local persistence failed.
    #[error("store error: {0}")]
    Store(#[from] beacon_store::StoreError),

    /// Settings could not be loaded.
    #[error("settings error: {0}")]
    Settings(#[from] beacon_settings::SettingsError),

    /// An event or session could not be serialized.
    #[error("core error: {0}")]
    Core(#[from] beacon_core::CoreError),

    /// The uploader could not be built or its worker is gone.
    #[error("upload error: {0}")]
    Upload(#[from] beacon_uploader::UploadError),
}

/// Convenience type alias for client results.
pub type Result<T> = std::result::Result<T, ClientError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn store_error_converts() {
        let err: ClientError = beacon_store::StoreError::Migration {
            message: "boom".into(),
        }
        .into();
        assert_eq!(err.to_string(), "store error: migration error: boom");
        assert_matches!(err, ClientError::Store(_));
    }

    #[test]
    fn upload_error_converts() {
        let err: ClientError = beacon_uploader::UploadError::WorkerClosed("gone".into()).into();
        assert!(err.to_string().contains("submit worker closed"));
    }
}
