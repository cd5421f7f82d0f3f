/**
 * DEVICE GATEWAY - Une opération par capacité du module caméra
 *
 * RÔLE :
 * Chaque opération est une spécialisation de `Transport::call` avec un chemin
 * fixe et un mode de réponse fixe. Les réponses structurées sont décodées en
 * types du module `models`.
 *
 * ROUTES :
 * - /pir_status            structured  (sonde de présence)
 * - /pir?state=on|off      text
 * - /relay?state=on|off    text
 * - /flash?state=on|off    text
 * - /dht                   structured  (champ `error` => SensorFault)
 * - /capture?method=manual binary
 * - /status                structured
 */

use crate::error::DeviceError;
use crate::models::{has_device_error, ClimateReading, DeviceStatus, PresenceStatus, Switch};
use crate::transport::{Payload, ResponseMode, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Clone)]
pub struct Gateway {
    transport: Transport,
    stream_url: String,
}

impl Gateway {
    pub fn new(transport: Transport, stream_url: impl Into<String>) -> Self {
        Self { transport, stream_url: stream_url.into() }
    }

    /// URL du flux MJPEG, servi en continu par le device (aucun appel réseau)
    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    pub async fn probe_presence(&self) -> Result<PresenceStatus, DeviceError> {
        self.structured("/pir_status").await
    }

    pub async fn set_motion_auto(&self, state: Switch) -> Result<String, DeviceError> {
        self.text(&format!("/pir?state={state}")).await
    }

    pub async fn set_relay(&self, state: Switch) -> Result<String, DeviceError> {
        self.text(&format!("/relay?state={state}")).await
    }

    pub async fn set_flash(&self, state: Switch) -> Result<String, DeviceError> {
        self.text(&format!("/flash?state={state}")).await
    }

    pub async fn read_climate(&self) -> Result<ClimateReading, DeviceError> {
        let value = self.raw_structured("/dht").await?;
        if has_device_error(&value) {
            let reason = value.get("error").map(|e| e.to_string()).unwrap_or_default();
            return Err(DeviceError::SensorFault(reason));
        }
        decode(value)
    }

    pub async fn capture_photo(&self) -> Result<Vec<u8>, DeviceError> {
        match self.transport.call("/capture?method=manual", ResponseMode::Binary).await? {
            Payload::Binary(bytes) => Ok(bytes),
            other => Err(unexpected(other)),
        }
    }

    pub async fn read_status(&self) -> Result<DeviceStatus, DeviceError> {
        self.structured("/status").await
    }

    async fn structured<T: DeserializeOwned>(&self, path: &str) -> Result<T, DeviceError> {
        let value = self.raw_structured(path).await?;
        if has_device_error(&value) {
            return Err(DeviceError::Other(format!("device reported error on {path}: {}", value["error"])));
        }
        decode(value)
    }

    async fn raw_structured(&self, path: &str) -> Result<Value, DeviceError> {
        match self.transport.call(path, ResponseMode::Structured).await? {
            Payload::Structured(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    async fn text(&self, path: &str) -> Result<String, DeviceError> {
        match self.transport.call(path, ResponseMode::Text).await? {
            Payload::Text(body) => Ok(body),
            other => Err(unexpected(other)),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, DeviceError> {
    serde_json::from_value(value).map_err(|e| DeviceError::Other(format!("unexpected response shape: {e}")))
}

fn unexpected(payload: Payload) -> DeviceError {
    DeviceError::Other(format!("unexpected payload variant: {payload:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use camlink_devkit::{device_stub::SAMPLE_JPEG, unreachable_base_url, Respond, StubDevice};
    use serde_json::json;
    use std::time::Duration;

    fn gateway_for(base_url: &str) -> Gateway {
        let transport = Transport::new(base_url, Duration::from_millis(500)).unwrap();
        Gateway::new(transport, "http://127.0.0.1:81/")
    }

    #[tokio::test]
    async fn test_switch_paths() {
        let device = StubDevice::start().await.unwrap();
        let gw = gateway_for(&device.base_url());

        gw.set_motion_auto(Switch::On).await.unwrap();
        gw.set_relay(Switch::Off).await.unwrap();
        gw.set_flash(Switch::On).await.unwrap();

        assert_eq!(
            device.requests(),
            vec!["/pir?state=on", "/relay?state=off", "/flash?state=on"]
        );
    }

    #[tokio::test]
    async fn test_read_climate() {
        let device = StubDevice::start().await.unwrap();
        let gw = gateway_for(&device.base_url());

        let reading = gw.read_climate().await.unwrap();
        assert_eq!(reading, ClimateReading { temperature: 23.456, humidity: 55.04 });
    }

    #[tokio::test]
    async fn test_climate_sensor_fault_is_distinct() {
        let device = StubDevice::start().await.unwrap();
        device.set("/dht", Respond::Json(json!({"error": "Failed to read from DHT sensor"})));
        let gw = gateway_for(&device.base_url());

        let err = gw.read_climate().await.unwrap_err();
        assert!(matches!(err, DeviceError::SensorFault(_)));
        assert_eq!(err.kind(), FailureKind::OtherError);
    }

    #[tokio::test]
    async fn test_status_with_error_field_is_other() {
        let device = StubDevice::start().await.unwrap();
        device.set("/status", Respond::Json(json!({"error": "busy"})));
        let gw = gateway_for(&device.base_url());

        let err = gw.read_status().await.unwrap_err();
        assert!(matches!(err, DeviceError::Other(_)));
    }

    #[tokio::test]
    async fn test_capture_returns_exact_bytes() {
        let device = StubDevice::start().await.unwrap();
        let gw = gateway_for(&device.base_url());

        let bytes = gw.capture_photo().await.unwrap();
        assert_eq!(bytes, SAMPLE_JPEG);
        assert_eq!(device.requests(), vec!["/capture?method=manual"]);
    }

    #[tokio::test]
    async fn test_read_status() {
        let device = StubDevice::start().await.unwrap();
        let gw = gateway_for(&device.base_url());

        let status = gw.read_status().await.unwrap();
        assert_eq!(status.pir.as_deref(), Some("on"));
        assert_eq!(status.uptime_sec, Some(3661));
    }

    #[tokio::test]
    async fn test_probe_against_unplugged_device() {
        let gw = gateway_for(&unreachable_base_url());
        let err = gw.probe_presence().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::NetworkUnreachable);
        assert!(err.disarms_polling());
    }
}
