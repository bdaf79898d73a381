//! HTTP [`Transport`] backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::transport::Transport;

/// Platform tag sent with every request.
pub const DEFAULT_PLATFORM: &str = "Rust";

/// Where and how to post batches.
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Collector URL.
    pub endpoint: String,
    /// Application id sent as `appId`.
    pub app_id: String,
    /// Platform tag sent as `platform`.
    pub platform: String,
    /// Sent verbatim as the `cookie` header when set.
    pub auth_cookie: Option<String>,
    /// Whole-request timeout.
    pub request_timeout: Duration,
}

impl HttpTransportConfig {
    /// Config with the default platform, no cookie and a 15 s timeout.
    pub fn new(endpoint: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            app_id: app_id.into(),
            platform: DEFAULT_PLATFORM.into(),
            auth_cookie: None,
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Posts batches as JSON to the collector endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Build the client.
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Config in effect.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn upload(&self, payload: &str, bundle_sequence_id: i64) -> bool {
        if payload.is_empty() {
            return false;
        }

        let query = [
            ("platform", self.config.platform.clone()),
            ("appId", self.config.app_id.clone()),
            ("hashCode", hash_code(payload)),
            ("event_bundle_sequence_id", bundle_sequence_id.to_string()),
            (
                "upload_timestamp",
                chrono::Utc::now().timestamp_millis().to_string(),
            ),
            ("compression", String::new()),
        ];

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .query(&query)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_owned());
        if let Some(cookie) = &self.config.auth_cookie {
            request = request.header(COOKIE, cookie);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!(bundle_sequence_id, status = %response.status(), "upload accepted");
                true
            }
            Ok(response) => {
                warn!(bundle_sequence_id, status = %response.status(), "upload rejected");
                false
            }
            Err(e) => {
                warn!(bundle_sequence_id, error = %e, "upload request failed");
                false
            }
        }
    }
}

/// First four bytes of the SHA-256 of `payload` as lowercase hex.
pub fn hash_code(payload: &str) -> String {
    let digest = Sha256::digest(payload.as_bytes());
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> HttpTransport {
        let mut config = HttpTransportConfig::new(format!("{}/collect", server.uri()), "shop");
        config.request_timeout = Duration::from_secs(5);
        HttpTransport::new(config).unwrap()
    }

    #[test]
    fn hash_code_is_sha256_prefix() {
        assert_eq!(hash_code(""), "e3b0c442");
        assert_eq!(hash_code("abc"), "ba7816bf");
    }

    #[tokio::test]
    async fn success_status_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collect"))
            .and(query_param("appId", "shop"))
            .and(query_param("platform", DEFAULT_PLATFORM))
            .and(query_param("event_bundle_sequence_id", "7"))
            .and(query_param("hashCode", hash_code("[{}]")))
            .and(header("content-type", "application/json"))
            .and(body_string("[{}]"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        assert!(transport(&server).upload("[{}]", 7).await);
    }

    #[tokio::test]
    async fn server_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(!transport(&server).upload("[{}]", 1).await);
    }

    #[tokio::test]
    async fn cookie_header_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("cookie", "auth=abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = HttpTransportConfig::new(format!("{}/collect", server.uri()), "shop");
        config.auth_cookie = Some("auth=abc".into());
        let transport = HttpTransport::new(config).unwrap();
        assert!(transport.upload("[1]", 1).await);
    }

    #[tokio::test]
    async fn empty_payload_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(!transport(&server).upload("", 1).await);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_rejected() {
        let config = HttpTransportConfig {
            request_timeout: Duration::from_millis(500),
            ..HttpTransportConfig::new("http://127.0.0.1:9/collect", "shop")
        };
        let transport = HttpTransport::new(config).unwrap();
        assert!(!transport.upload("[1]", 1).await);
    }
}
