/*!
Stub HTTP du module caméra

Serveur axum local qui répond sur les mêmes routes que le device réel.
Chaque route a une réponse scriptable et chaque requête reçue est enregistrée
pour les assertions de tests.
*/

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Réponse programmée pour une route du stub
#[derive(Debug, Clone)]
pub enum Respond {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
    Status(u16),
    Delayed(Duration, Box<Respond>),
}

#[derive(Clone, Default)]
struct StubState {
    routes: Arc<Mutex<HashMap<String, Respond>>>,
    hits: Arc<Mutex<Vec<String>>>,
}

/// Device simulé, arrêté automatiquement au drop
pub struct StubDevice {
    addr: SocketAddr,
    state: StubState,
    server: JoinHandle<()>,
}

/// Bytes minimaux d'un JPEG (SOI ... EOI)
pub const SAMPLE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9];

impl StubDevice {
    /// Démarre un stub sur 127.0.0.1 (port éphémère) avec les réponses par défaut d'un device sain
    pub async fn start() -> Result<Self> {
        let state = StubState::default();
        {
            let mut routes = state.routes.lock();
            routes.insert("/pir_status".into(), Respond::Json(json!({ "pir": "off" })));
            routes.insert("/pir".into(), Respond::Text("OK".into()));
            routes.insert("/relay".into(), Respond::Text("OK".into()));
            routes.insert("/flash".into(), Respond::Text("OK".into()));
            routes.insert(
                "/dht".into(),
                Respond::Json(json!({ "temperature": 23.456, "humidity": 55.04 })),
            );
            routes.insert("/capture".into(), Respond::Bytes(SAMPLE_JPEG.to_vec()));
            routes.insert(
                "/status".into(),
                Respond::Json(json!({
                    "pir": "on",
                    "relay": "off",
                    "flash": "off",
                    "temperature": 41.5,
                    "chip_model": "ESP32-S3",
                    "chip_cores": 2,
                    "chip_features": ["WiFi", "BLE"],
                    "uptime_sec": 3661,
                    "rssi": -58
                })),
            );
        }

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind stub device")?;
        let addr = listener.local_addr()?;

        let app = Router::new().fallback(handle).with_state(state.clone());
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("stub device stopped: {e}");
            }
        });

        tracing::debug!("stub device listening on {addr}");
        Ok(Self { addr, state, server })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Programme la réponse d'une route. La clé peut inclure la query (`/pir?state=on`),
    /// sinon elle s'applique à toutes les queries du chemin.
    pub fn set(&self, route: &str, respond: Respond) {
        self.state.routes.lock().insert(route.to_string(), respond);
    }

    /// Nombre de requêtes reçues sur un chemin (avec ou sans query)
    pub fn hits(&self, route: &str) -> usize {
        self.state
            .hits
            .lock()
            .iter()
            .filter(|h| h.as_str() == route || h.split('?').next() == Some(route))
            .count()
    }

    /// Toutes les requêtes reçues, dans l'ordre
    pub fn requests(&self) -> Vec<String> {
        self.state.hits.lock().clone()
    }

    pub fn clear_hits(&self) {
        self.state.hits.lock().clear();
    }
}

impl Drop for StubDevice {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn handle(State(state): State<StubState>, uri: Uri) -> Response {
    let key = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    state.hits.lock().push(key.clone());

    let respond = {
        let routes = state.routes.lock();
        routes.get(&key).or_else(|| routes.get(uri.path())).cloned()
    };

    match respond {
        Some(r) => render(r).await,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn render(mut respond: Respond) -> Response {
    loop {
        match respond {
            Respond::Delayed(delay, inner) => {
                tokio::time::sleep(delay).await;
                respond = *inner;
            }
            Respond::Json(v) => return Json(v).into_response(),
            Respond::Text(t) => return t.into_response(),
            Respond::Bytes(b) => return ([(header::CONTENT_TYPE, "image/jpeg")], b).into_response(),
            Respond::Status(code) => {
                return StatusCode::from_u16(code)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                    .into_response()
            }
        }
    }
}

/// URL de base dont le port refuse les connexions (simule un device débranché)
pub fn unreachable_base_url() -> String {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .unwrap_or(9);
    format!("http://127.0.0.1:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn get(url: &str) -> (u16, Vec<u8>) {
        let resp = reqwest::get(url).await.unwrap();
        let code = resp.status().as_u16();
        (code, resp.bytes().await.unwrap().to_vec())
    }

    #[tokio::test]
    async fn test_default_routes_and_hits() {
        let device = StubDevice::start().await.unwrap();
        let (code, body) = get(&format!("{}/relay?state=on", device.base_url())).await;
        assert_eq!(code, 200);
        assert_eq!(body, b"OK");
        assert_eq!(device.hits("/relay"), 1);
        assert_eq!(device.hits("/relay?state=on"), 1);
        assert_eq!(device.hits("/flash"), 0);
    }

    #[tokio::test]
    async fn test_query_specific_route_wins() {
        let device = StubDevice::start().await.unwrap();
        device.set("/pir?state=off", Respond::Status(503));
        let (on, _) = get(&format!("{}/pir?state=on", device.base_url())).await;
        let (off, _) = get(&format!("{}/pir?state=off", device.base_url())).await;
        assert_eq!(on, 200);
        assert_eq!(off, 503);
        assert_eq!(device.requests(), vec!["/pir?state=on", "/pir?state=off"]);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let device = StubDevice::start().await.unwrap();
        let (code, _) = get(&format!("{}/nope", device.base_url())).await;
        assert_eq!(code, 404);
    }

    #[tokio::test]
    async fn test_unreachable_port_refuses() {
        let err = reqwest::get(format!("{}/status", unreachable_base_url())).await.unwrap_err();
        assert!(err.is_connect());
    }
}
