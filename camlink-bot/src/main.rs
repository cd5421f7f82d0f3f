/**
 * CAMLINK BOT - Point d'entrée du relais chat → module caméra
 *
 * RÔLE : Bootstrap de tous les modules : config, transport HTTP, gateway,
 * poller de présence, dispatcher, adaptateur chat et endpoint de liveness.
 *
 * FLUX : message chat → router → dispatcher → gateway → transport → device,
 * puis réponse formatée renvoyée sur le canal d'origine. Le poller tourne à
 * part tant que le mode PIR auto est armé.
 */

mod chat;
mod config;
mod console;
mod dispatcher;
mod error;
mod gateway;
mod http;
mod models;
mod poller;
mod render;
mod transport;

use crate::chat::{MessageRouter, SharedChannel};
use crate::config::load_config;
use crate::console::ConsoleChannel;
use crate::dispatcher::Dispatcher;
use crate::gateway::Gateway;
use crate::poller::PresencePoller;
use crate::transport::Transport;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("camlink_bot=info")),
        )
        .init();

    let cfg = load_config().await;
    let transport = Transport::new(cfg.device.base_url(), cfg.device.timeout())
        .context("Failed to build device transport")?;
    info!(
        device = %transport.base_url(),
        timeout = ?transport.timeout(),
        poll_interval_ms = cfg.device.poll_interval_ms,
        "camlink relay starting"
    );

    let gateway = Gateway::new(transport, cfg.device.stream_url());
    let poller = PresencePoller::new(gateway.clone(), cfg.device.poll_interval());
    let dispatcher = Arc::new(Dispatcher::new(gateway, poller, cfg.chat.command_prefix.clone()));
    let router = MessageRouter::new(dispatcher.clone(), cfg.chat.command_prefix.clone());

    // liveness pour l'hébergeur, indépendant du reste
    let liveness_port = cfg.liveness.port;
    tokio::spawn(async move {
        if let Err(e) = http::serve(liveness_port).await {
            error!("liveness endpoint failed: {e:#}");
        }
    });

    let console: SharedChannel = Arc::new(ConsoleChannel::new(cfg.chat.capture_dir.clone()));
    info!("type `{}help` for the command list", cfg.chat.command_prefix);

    tokio::select! {
        res = console::run(&router, console) => res.context("Console adapter failed")?,
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    let poller = dispatcher.poller();
    let was_armed = poller.disarm();
    info!(
        was_armed,
        pending = poller.pending_probes(),
        generation = poller.generation(),
        "camlink relay stopped"
    );
    Ok(())
}
