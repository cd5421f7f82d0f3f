/**
 * LIVENESS HTTP - Endpoint minimal pour l'hébergeur
 *
 * RÔLE :
 * Certains hébergeurs exigent qu'un process écoute sur le port fourni (`PORT`)
 * pour le considérer vivant. Aucune logique métier ici.
 *
 * ROUTES :
 * - GET /        → texte statique
 * - GET /health  → "ok"
 */

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

pub const LIVENESS_TEXT: &str = "Camlink relay is running.";

pub fn build_router() -> Router {
    Router::new()
        .route("/", get(|| async { LIVENESS_TEXT }))
        .route("/health", get(|| async { "ok" }))
}

pub async fn serve(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("liveness endpoint listening on http://{addr}");
    axum::serve(listener, build_router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness_routes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { axum::serve(listener, build_router()).await });

        let root = reqwest::get(format!("http://{addr}/")).await.unwrap();
        assert_eq!(root.status(), 200);
        assert_eq!(root.text().await.unwrap(), LIVENESS_TEXT);

        let health = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");

        let missing = reqwest::get(format!("http://{addr}/nope")).await.unwrap();
        assert_eq!(missing.status(), 404);

        server.abort();
    }
}
