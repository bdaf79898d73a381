//! Scriptable [`Transport`] and [`Connectivity`] doubles.
//!
//! Public so the facade crate's integration tests can drive the uploader
//! without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::transport::{Connectivity, Transport};

/// One observed upload.
#[derive(Clone, Debug)]
pub struct UploadCall {
    /// Payload as handed to the transport.
    pub payload: String,
    /// Sequence id attached to the attempt.
    pub bundle_sequence_id: i64,
    /// Number of events in the payload array.
    pub event_count: usize,
}

/// Transport that records calls and answers from a script.
///
/// Once the script runs out, `fallback` is returned.
pub struct RecordingTransport {
    calls: Mutex<Vec<UploadCall>>,
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
}

impl RecordingTransport {
    /// Accept every upload.
    pub fn succeeding() -> Self {
        Self::with_results_then(Vec::new(), true)
    }

    /// Reject every upload.
    pub fn failing() -> Self {
        Self::with_results_then(Vec::new(), false)
    }

    /// Answer with `results` in order, then reject.
    pub fn with_results(results: Vec<bool>) -> Self {
        Self::with_results_then(results, false)
    }

    /// Answer with `results` in order, then `fallback`.
    pub fn with_results_then(results: Vec<bool>, fallback: bool) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(results.into()),
            fallback,
        }
    }

    /// Calls observed so far.
    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().clone()
    }

    /// Total events across accepted and rejected uploads.
    pub fn uploaded_events(&self) -> usize {
        self.calls.lock().iter().map(|c| c.event_count).sum()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn upload(&self, payload: &str, bundle_sequence_id: i64) -> bool {
        let event_count = serde_json::from_str::<Vec<serde_json::Value>>(payload)
            .map(|events| events.len())
            .unwrap_or(0);
        self.calls.lock().push(UploadCall {
            payload: payload.to_owned(),
            bundle_sequence_id,
            event_count,
        });
        self.script.lock().pop_front().unwrap_or(self.fallback)
    }
}

/// Connectivity toggled by the test.
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    /// Start online or offline.
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    /// Flip the reported state.
    pub fn set(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for StaticConnectivity {
    fn is_network_available(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
