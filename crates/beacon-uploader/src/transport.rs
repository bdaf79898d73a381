//! Collaborator seams consumed by the uploader.

use async_trait::async_trait;

/// Delivers one batch to the collector.
///
/// Timeouts, retries within a request, compression and auth are the
/// implementation's business. Any failure is reported as `false`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Upload a JSON array of events. `true` means the collector accepted it.
    async fn upload(&self, payload: &str, bundle_sequence_id: i64) -> bool;
}

/// Reports whether a network path exists.
pub trait Connectivity: Send + Sync {
    /// `false` makes a processing pass a no-op.
    fn is_network_available(&self) -> bool;
}

/// Connectivity that always reports a network.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_network_available(&self) -> bool {
        true
    }
}
