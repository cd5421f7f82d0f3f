use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use tokio::fs;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct BotConfig {
    pub device: DeviceConf,
    pub chat: ChatConf,
    pub liveness: LivenessConf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DeviceConf {
    pub host: String,
    pub port: u16,
    /// Remplace `http://{host}:{port}` quand présent
    pub base_url: Option<String>,
    pub stream_port: u16,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConf {
    pub command_prefix: String,
    pub capture_dir: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LivenessConf {
    pub port: u16,
}

impl Default for DeviceConf {
    fn default() -> Self {
        Self {
            host: "192.168.137.173".into(),
            port: 80,
            base_url: None,
            stream_port: 81,
            timeout_ms: 5000,
            poll_interval_ms: 1000,
        }
    }
}

impl Default for ChatConf {
    fn default() -> Self {
        Self { command_prefix: "!".into(), capture_dir: "./captures".into() }
    }
}

impl Default for LivenessConf {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

impl DeviceConf {
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }

    /// Le flux MJPEG est toujours servi sur un port dédié du même hôte.
    pub fn stream_url(&self) -> String {
        let host = self
            .base_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.host.clone());
        format!("http://{}:{}/", host, self.stream_port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl BotConfig {
    /// Construit la config depuis un YAML optionnel puis applique les overrides d'environnement.
    pub fn from_sources<F>(yaml: Option<&str>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match yaml.map(str::trim) {
            Some(txt) if !txt.is_empty() => serde_yaml::from_str(txt).unwrap_or_else(|e| {
                warn!("invalid config file, using defaults: {e}");
                BotConfig::default()
            }),
            _ => BotConfig::default(),
        };

        if let Some(host) = env("ESP32_IP") {
            cfg.device.host = host;
        }
        if let Some(port) = parse_env(&env, "ESP32_PORT") {
            cfg.device.port = port;
        }
        if let Some(url) = env("ESP32_BASE_URL").filter(|u| !u.trim().is_empty()) {
            cfg.device.base_url = Some(url);
        }
        if let Some(port) = parse_env(&env, "ESP32_STREAM_PORT") {
            cfg.device.stream_port = port;
        }
        if let Some(port) = parse_env(&env, "PORT") {
            cfg.liveness.port = port;
        }
        if let Some(prefix) = env("CAMLINK_COMMAND_PREFIX").filter(|p| !p.is_empty()) {
            cfg.chat.command_prefix = prefix;
        }
        if let Some(dir) = env("CAMLINK_CAPTURE_DIR") {
            cfg.chat.capture_dir = dir;
        }
        cfg
    }
}

fn parse_env<F, T>(env: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

pub async fn load_config() -> BotConfig {
    let path = std::env::var("CAMLINK_CONFIG").unwrap_or_else(|_| "camlink.yaml".into());
    let yaml = if Path::new(&path).exists() {
        Some(fs::read_to_string(&path).await.unwrap_or_default())
    } else {
        warn!("no {path}, using default config");
        None
    };
    BotConfig::from_sources(yaml.as_deref(), |key| std::env::var(key).ok())
}
