//! HTTP transport towards the device
//!
//! One pooled `reqwest::Client` with a fixed per-request timeout. Every
//! failure comes back as a classified [`DeviceError`], never as a panic.

use crate::error::DeviceError;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// How the response body of a call is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Structured,
    Text,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Structured(serde_json::Value),
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Clone)]
pub struct Transport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Transport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DeviceError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| DeviceError::Other(format!("building http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URLs are used verbatim; anything else is appended to the base address.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn call(&self, path: &str, mode: ResponseMode) -> Result<Payload, DeviceError> {
        let url = self.resolve_url(path);
        debug!(url = %url, mode = ?mode, "device GET");

        let result = self.fetch(&url, mode).await;
        if let Err(e) = &result {
            warn!(path = %path, kind = %e.kind(), "device call failed: {e}");
        }
        result
    }

    async fn fetch(&self, url: &str, mode: ResponseMode) -> Result<Payload, DeviceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(DeviceError::from_http)?;

        match mode {
            ResponseMode::Structured => {
                let bytes = response.bytes().await.map_err(DeviceError::from_http)?;
                serde_json::from_slice(&bytes)
                    .map(Payload::Structured)
                    .map_err(|e| DeviceError::Other(format!("invalid JSON body: {e}")))
            }
            ResponseMode::Text => response
                .text()
                .await
                .map(Payload::Text)
                .map_err(DeviceError::from_http),
            ResponseMode::Binary => response
                .bytes()
                .await
                .map(|b| Payload::Binary(b.to_vec()))
                .map_err(DeviceError::from_http),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use camlink_devkit::{unreachable_base_url, Respond, StubDevice};
    use serde_json::json;

    #[test]
    fn test_resolve_url() {
        let t = Transport::new("http://10.0.0.2:80/", Duration::from_secs(1)).unwrap();
        assert_eq!(t.resolve_url("/status"), "http://10.0.0.2:80/status");
        assert_eq!(t.resolve_url("dht"), "http://10.0.0.2:80/dht");
        assert_eq!(t.resolve_url("http://10.0.0.2:81/"), "http://10.0.0.2:81/");
        assert_eq!(t.resolve_url("https://other.host/x?y=1"), "https://other.host/x?y=1");
    }

    #[tokio::test]
    async fn test_three_response_modes() {
        let device = StubDevice::start().await.unwrap();
        device.set("/status", Respond::Json(json!({"pir": "on"})));
        device.set("/relay", Respond::Text("RELAY ON".into()));
        device.set("/capture", Respond::Bytes(vec![0xFF, 0xD8, 0x00, 0xFF, 0xD9]));
        let t = Transport::new(device.base_url(), Duration::from_secs(2)).unwrap();

        let p = t.call("/status", ResponseMode::Structured).await.unwrap();
        assert_eq!(p, Payload::Structured(json!({"pir": "on"})));

        let p = t.call("/relay?state=on", ResponseMode::Text).await.unwrap();
        assert_eq!(p, Payload::Text("RELAY ON".into()));

        let p = t.call("/capture?method=manual", ResponseMode::Binary).await.unwrap();
        assert_eq!(p, Payload::Binary(vec![0xFF, 0xD8, 0x00, 0xFF, 0xD9]));
    }

    #[tokio::test]
    async fn test_absolute_url_bypasses_base() {
        let device = StubDevice::start().await.unwrap();
        device.set("/aux", Respond::Text("aux".into()));
        let t = Transport::new(unreachable_base_url(), Duration::from_secs(2)).unwrap();

        let url = format!("{}/aux", device.base_url());
        let p = t.call(&url, ResponseMode::Text).await.unwrap();
        assert_eq!(p, Payload::Text("aux".into()));
        assert_eq!(device.hits("/aux"), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let device = StubDevice::start().await.unwrap();
        device.set(
            "/pir_status",
            Respond::Delayed(Duration::from_millis(800), Box::new(Respond::Json(json!({})))),
        );
        let t = Transport::new(device.base_url(), Duration::from_millis(100)).unwrap();

        let err = t.call("/pir_status", ResponseMode::Structured).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Timeout);
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        let t = Transport::new(unreachable_base_url(), Duration::from_secs(2)).unwrap();
        let err = t.call("/pir_status", ResponseMode::Structured).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::NetworkUnreachable);
    }

    #[tokio::test]
    async fn test_http_status_and_bad_json_are_other() {
        let device = StubDevice::start().await.unwrap();
        device.set("/status", Respond::Status(500));
        device.set("/dht", Respond::Text("not json".into()));
        let t = Transport::new(device.base_url(), Duration::from_secs(2)).unwrap();

        let err = t.call("/status", ResponseMode::Structured).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::OtherError);

        let err = t.call("/dht", ResponseMode::Structured).await.unwrap_err();
        assert!(matches!(err, DeviceError::Other(ref m) if m.starts_with("invalid JSON body")));
    }
}
