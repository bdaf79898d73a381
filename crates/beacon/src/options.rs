//! Construction inputs for [`crate::AnalyticsClient`].

use std::sync::Arc;
use std::time::Duration;

use beacon_core::{AppInfo, Clock, DeviceInfo, SdkInfo, SystemClock};
use beacon_settings::BeaconSettings;
use beacon_uploader::{
    AlwaysOnline, Connectivity, HttpTransport, HttpTransportConfig, Transport, UploadLimits,
};

use crate::errors::Result;

/// Settings, host context and collaborators for a client.
pub struct ClientOptions {
    /// SDK settings.
    pub settings: BeaconSettings,
    /// Device details stamped onto events.
    pub device: DeviceInfo,
    /// App details stamped onto events.
    pub app: AppInfo,
    /// SDK identification.
    pub sdk: SdkInfo,
    /// Upload seam.
    pub transport: Arc<dyn Transport>,
    /// Network availability seam.
    pub connectivity: Arc<dyn Connectivity>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl ClientOptions {
    /// Options with an always-online connectivity check and the system clock.
    pub fn new(settings: BeaconSettings, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            device: DeviceInfo::default(),
            app: AppInfo::default(),
            sdk: SdkInfo::default(),
            transport,
            connectivity: Arc::new(AlwaysOnline),
            clock: Arc::new(SystemClock),
        }
    }

    /// Options that upload to `settings.endpoint` over HTTP.
    pub fn with_http(settings: BeaconSettings) -> Result<Self> {
        let config = HttpTransportConfig {
            auth_cookie: settings.auth_cookie.clone(),
            request_timeout: Duration::from_millis(settings.uploader.request_timeout_ms),
            ..HttpTransportConfig::new(settings.endpoint.clone(), settings.app_id.clone())
        };
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(settings, Arc::new(transport)))
    }

    /// Set device details.
    #[must_use]
    pub fn device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    /// Set app details.
    #[must_use]
    pub fn app(mut self, app: AppInfo) -> Self {
        self.app = app;
        self
    }

    /// Replace the connectivity check.
    #[must_use]
    pub fn connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Replace the clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn upload_limits(&self) -> UploadLimits {
        let uploader = &self.settings.uploader;
        UploadLimits {
            max_submissions_per_pass: uploader.max_submissions_per_pass,
            max_submission_size_bytes: i64::try_from(uploader.max_submission_size_bytes)
                .unwrap_or(i64::MAX),
            max_events_per_batch: uploader.max_events_per_batch,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_uploader::test_utils::RecordingTransport;

    #[test]
    fn upload_limits_follow_settings() {
        let mut settings = BeaconSettings::default();
        settings.uploader.max_submissions_per_pass = 5;
        settings.uploader.max_events_per_batch = 20;
        let options = ClientOptions::new(settings, Arc::new(RecordingTransport::succeeding()));

        let limits = options.upload_limits();
        assert_eq!(limits.max_submissions_per_pass, 5);
        assert_eq!(limits.max_events_per_batch, 20);
        assert_eq!(limits.max_submission_size_bytes, 512 * 1024);
    }

    #[test]
    fn http_options_build() {
        let settings = BeaconSettings {
            app_id: "shop".into(),
            endpoint: "https://collect.example.com/collect".into(),
            ..BeaconSettings::default()
        };
        assert!(ClientOptions::with_http(settings).is_ok());
    }
}
