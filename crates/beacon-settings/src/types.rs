//! Settings types.
//!
//! Every struct uses `#[serde(rename_all = "camelCase", default)]` so a
//! partial JSON file fills in missing fields from [`Default`].

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BeaconSettings {
    /// Application id registered with the collector.
    pub app_id: String,
    /// Collector endpoint URL.
    pub endpoint: String,
    /// A paused session resumed within this window continues.
    pub session_timeout_ms: u64,
    /// Period of the automatic flush; `0` disables it.
    pub send_events_interval_ms: u64,
    /// Log every recorded event at debug level.
    pub is_log_events: bool,
    /// Cookie header sent with uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_cookie: Option<String>,
    /// Local queue limits.
    pub queue: QueueSettings,
    /// Upload batching limits.
    pub uploader: UploaderSettings,
}

impl Default for BeaconSettings {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            endpoint: String::new(),
            session_timeout_ms: 1_800_000,
            send_events_interval_ms: 10_000,
            is_log_events: false,
            auth_cookie: None,
            queue: QueueSettings::default(),
            uploader: UploaderSettings::default(),
        }
    }
}

impl BeaconSettings {
    /// Reject values that would make the queue or uploader unusable.
    pub fn validate(&self) -> Result<()> {
        if self.queue.max_db_size_bytes == 0 {
            return Err(SettingsError::InvalidValue(
                "queue.maxDbSizeBytes must be positive".into(),
            ));
        }
        if self.queue.eviction_chunk == 0 {
            return Err(SettingsError::InvalidValue(
                "queue.evictionChunk must be positive".into(),
            ));
        }
        if self.uploader.max_events_per_batch == 0 || self.uploader.max_submission_size_bytes == 0 {
            return Err(SettingsError::InvalidValue(
                "uploader batch limits must be positive".into(),
            ));
        }
        if self.uploader.max_pending_submissions == 0 {
            return Err(SettingsError::InvalidValue(
                "uploader.maxPendingSubmissions must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Local queue limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueSettings {
    /// Cap on the summed size of queued payloads.
    pub max_db_size_bytes: u64,
    /// Oldest rows fetched per eviction step.
    pub eviction_chunk: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_db_size_bytes: 50 * 1024 * 1024,
            eviction_chunk: 5,
        }
    }
}

/// Upload batching limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploaderSettings {
    /// Batches uploaded per processing pass.
    pub max_submissions_per_pass: usize,
    /// Byte cap per batch (a single larger entry is still sent alone).
    pub max_submission_size_bytes: u64,
    /// Entry cap per batch.
    pub max_events_per_batch: usize,
    /// Pending submit requests kept before new ones are dropped.
    pub max_pending_submissions: usize,
    /// HTTP request timeout.
    pub request_timeout_ms: u64,
}

impl Default for UploaderSettings {
    fn default() -> Self {
        Self {
            max_submissions_per_pass: 3,
            max_submission_size_bytes: 512 * 1024,
            max_events_per_batch: 100,
            max_pending_submissions: 1000,
            request_timeout_ms: 15_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults() {
        let s = BeaconSettings::default();
        assert_eq!(s.session_timeout_ms, 1_800_000);
        assert_eq!(s.send_events_interval_ms, 10_000);
        assert_eq!(s.queue.max_db_size_bytes, 52_428_800);
        assert_eq!(s.queue.eviction_chunk, 5);
        assert_eq!(s.uploader.max_submissions_per_pass, 3);
        assert_eq!(s.uploader.max_submission_size_bytes, 524_288);
        assert_eq!(s.uploader.max_events_per_batch, 100);
        assert_eq!(s.uploader.max_pending_submissions, 1000);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(BeaconSettings::default()).unwrap();
        assert!(json.get("sessionTimeoutMs").is_some());
        assert!(json["uploader"].get("maxEventsPerBatch").is_some());
        assert!(json.get("authCookie").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: BeaconSettings = serde_json::from_str(r#"{"appId": "shop"}"#).unwrap();
        assert_eq!(s.app_id, "shop");
        assert_eq!(s.uploader, UploaderSettings::default());
    }

    #[test]
    fn zero_limits_rejected() {
        let mut s = BeaconSettings::default();
        s.uploader.max_events_per_batch = 0;
        assert_matches!(s.validate(), Err(SettingsError::InvalidValue(_)));

        let mut s = BeaconSettings::default();
        s.queue.eviction_chunk = 0;
        assert_matches!(s.validate(), Err(SettingsError::InvalidValue(_)));
    }
}
