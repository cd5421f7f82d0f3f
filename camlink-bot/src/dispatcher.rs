//! Command dispatcher: one chat command, at most one gateway call, exactly one reply.
//!
//! Usage errors are caught while parsing, before anything reaches the
//! device. Every gateway failure degrades to a "cannot connect" reply; the
//! timeout/unreachable distinction only matters to the poller.

use crate::chat::{Attachment, Reply, SharedChannel};
use crate::error::DeviceError;
use crate::gateway::Gateway;
use crate::models::Switch;
use crate::poller::PresencePoller;
use crate::render;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Pir(Switch),
    Relay(Switch),
    Flash(Switch),
    Dht,
    Photo,
    Status,
    Stream,
    /// `pir`, `relay` ou `flash` sans argument `on`/`off` valide
    Usage(&'static str),
    Unknown(String),
}

impl Command {
    pub fn parse(token: &str, args: &[String]) -> Self {
        let token = token.to_lowercase();
        let switch = || args.first().and_then(|a| a.parse::<Switch>().ok());

        match token.as_str() {
            "help" | "start" => Command::Help,
            "pir" => switch().map(Command::Pir).unwrap_or(Command::Usage("pir")),
            "relay" => switch().map(Command::Relay).unwrap_or(Command::Usage("relay")),
            "flash" => switch().map(Command::Flash).unwrap_or(Command::Usage("flash")),
            "dht" => Command::Dht,
            "photo" => Command::Photo,
            "status" => Command::Status,
            "stream" => Command::Stream,
            _ => Command::Unknown(token),
        }
    }
}

pub struct Dispatcher {
    gateway: Gateway,
    poller: PresencePoller,
    prefix: String,
}

impl Dispatcher {
    pub fn new(gateway: Gateway, poller: PresencePoller, prefix: impl Into<String>) -> Self {
        Self { gateway, poller, prefix: prefix.into() }
    }

    pub fn poller(&self) -> &PresencePoller {
        &self.poller
    }

    /// `origin` is the chat context that receives poller notifications after `pir on`.
    pub async fn dispatch(&self, token: &str, args: &[String], origin: &SharedChannel) -> Reply {
        let command = Command::parse(token, args);
        debug!(?command, "dispatching");
        self.execute(command, origin).await
    }

    pub async fn execute(&self, command: Command, origin: &SharedChannel) -> Reply {
        match command {
            Command::Help => Reply::text(render::help(&self.prefix, self.gateway.stream_url())),
            Command::Stream => Reply::text(render::stream(self.gateway.stream_url())),
            Command::Usage(name) => Reply::text(render::usage(&self.prefix, name)),
            Command::Unknown(_) => Reply::text(render::invalid_command(&self.prefix)),

            Command::Pir(state) => {
                let result = self.gateway.set_motion_auto(state).await;
                // l'effet de bord arm/disarm est tenté même si le device n'a pas répondu
                match state {
                    Switch::On => self.poller.arm(origin.clone()),
                    Switch::Off => {
                        self.poller.disarm();
                    }
                }
                match result {
                    Ok(_) => Reply::text(render::pir_toggled(state)),
                    Err(_) => Reply::text(render::cannot_connect("enable/disable PIR")),
                }
            }
            Command::Relay(state) => match self.gateway.set_relay(state).await {
                Ok(_) => Reply::text(render::relay_toggled(state)),
                Err(_) => Reply::text(render::cannot_connect("control relay")),
            },
            Command::Flash(state) => match self.gateway.set_flash(state).await {
                Ok(_) => Reply::text(render::flash_toggled(state)),
                Err(_) => Reply::text(render::cannot_connect("control flash")),
            },
            Command::Dht => match self.gateway.read_climate().await {
                Ok(reading) => Reply::text(render::climate(&reading)),
                Err(DeviceError::SensorFault(_)) => Reply::text(render::SENSOR_FAILED),
                Err(_) => Reply::text(render::cannot_connect("read DHT11")),
            },
            Command::Photo => match self.gateway.capture_photo().await {
                Ok(bytes) => Reply::with_attachment(
                    render::PHOTO_CAPTION,
                    Attachment { filename: render::PHOTO_FILENAME.to_string(), bytes },
                ),
                Err(_) => Reply::text(render::cannot_connect("capture photo")),
            },
            Command::Status => match self.gateway.read_status().await {
                Ok(status) => Reply::text(render::status(&status)),
                Err(_) => Reply::text(render::cannot_connect("get status")),
            },
        }
    }
}
