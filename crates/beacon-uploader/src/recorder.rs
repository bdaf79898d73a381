//! One processing pass: read the queue, upload batches, delete delivered
//! ranges.

use std::sync::Arc;

use beacon_store::{EventQueue, PreferenceStore};
use tracing::{debug, info, warn};

use crate::batch::BatchBuilder;
use crate::errors::Result;
use crate::transport::{Connectivity, Transport};

/// Default batches per pass.
pub const DEFAULT_MAX_SUBMISSIONS: usize = 3;
/// Default byte cap per batch: 512 KiB.
pub const DEFAULT_MAX_SUBMISSION_SIZE: i64 = 512 * 1024;
/// Default entry cap per batch.
pub const DEFAULT_MAX_EVENTS_PER_BATCH: usize = 100;

/// Per-pass and per-batch limits.
#[derive(Clone, Debug)]
pub struct UploadLimits {
    /// Upload attempts per pass.
    pub max_submissions_per_pass: usize,
    /// Byte cap per batch.
    pub max_submission_size_bytes: i64,
    /// Entry cap per batch.
    pub max_events_per_batch: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_submissions_per_pass: DEFAULT_MAX_SUBMISSIONS,
            max_submission_size_bytes: DEFAULT_MAX_SUBMISSION_SIZE,
            max_events_per_batch: DEFAULT_MAX_EVENTS_PER_BATCH,
        }
    }
}

/// Uploads queued events through a [`Transport`].
pub struct EventRecorder {
    queue: Arc<EventQueue>,
    prefs: Arc<PreferenceStore>,
    transport: Arc<dyn Transport>,
    connectivity: Arc<dyn Connectivity>,
    limits: UploadLimits,
}

impl EventRecorder {
    /// Create a recorder over the shared queue and preference store.
    pub fn new(
        queue: Arc<EventQueue>,
        prefs: Arc<PreferenceStore>,
        transport: Arc<dyn Transport>,
        connectivity: Arc<dyn Connectivity>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            queue,
            prefs,
            transport,
            connectivity,
            limits,
        }
    }

    /// Limits in effect.
    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Run one pass. Returns how many entries were delivered and deleted.
    ///
    /// Stops at the first failed upload (the batch stays queued) or after
    /// `max_submissions_per_pass` attempts. Every attempt consumes one
    /// bundle sequence id.
    pub async fn process_events(&self) -> Result<usize> {
        if !self.connectivity.is_network_available() {
            debug!("no network, skipping pass");
            return Ok(0);
        }

        let cursor = self.queue.cursor(self.limits.max_events_per_batch + 1);
        let mut batches = BatchBuilder::new(
            cursor,
            self.limits.max_submission_size_bytes,
            self.limits.max_events_per_batch,
        );

        let mut delivered = 0;
        for attempt in 1..=self.limits.max_submissions_per_pass {
            let Some(batch) = batches.next_batch()? else {
                break;
            };

            let sequence = self.prefs.bundle_sequence_id()?;
            let accepted = self.transport.upload(&batch.payload, sequence).await;
            self.prefs.set_bundle_sequence_id(sequence + 1)?;

            if !accepted {
                warn!(
                    attempt,
                    sequence,
                    count = batch.count,
                    "upload failed, batch left queued"
                );
                break;
            }

            let deleted = self.queue.delete_up_to(batch.last_id)?;
            debug!(
                attempt,
                sequence,
                count = batch.count,
                size = batch.size_bytes,
                deleted,
                "batch delivered"
            );
            delivered += deleted;
        }

        if delivered > 0 {
            info!(delivered, "processing pass complete");
        }
        Ok(delivered)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
