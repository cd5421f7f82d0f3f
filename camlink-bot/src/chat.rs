//! Chat platform boundary
//!
//! The relay only needs two things from a chat platform: inbound text
//! messages and a way to reply on the channel a message came from. Any
//! adapter (the console one in `console.rs`, or a real chat client)
//! implements [`ReplyChannel`] and feeds [`MessageRouter::handle`].

use crate::dispatcher::Dispatcher;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), attachment: None }
    }

    pub fn with_attachment(text: impl Into<String>, attachment: Attachment) -> Self {
        Self { text: text.into(), attachment: Some(attachment) }
    }
}

/// Where replies (and out-of-band notifications) for one chat context go.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    async fn send(&self, reply: Reply) -> anyhow::Result<()>;
}

pub type SharedChannel = Arc<dyn ReplyChannel>;

#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub author: String,
    pub author_is_bot: bool,
    pub text: String,
}

pub struct MessageRouter {
    dispatcher: Arc<Dispatcher>,
    prefix: String,
}

impl MessageRouter {
    pub fn new(dispatcher: Arc<Dispatcher>, prefix: impl Into<String>) -> Self {
        Self { dispatcher, prefix: prefix.into() }
    }

    /// Splits a prefixed message into a lower-cased command token and its arguments.
    pub fn tokenize(&self, text: &str) -> Option<(String, Vec<String>)> {
        let mut parts = text.split_whitespace();
        let command = parts.next()?.strip_prefix(self.prefix.as_str())?.to_lowercase();
        Some((command, parts.map(str::to_lowercase).collect()))
    }

    /// Handles one inbound message in its own task. A handler that panics is
    /// logged and produces no reply; the caller is never affected.
    pub async fn handle(&self, message: InboundMessage, channel: SharedChannel) {
        if message.author_is_bot {
            return;
        }
        let Some((command, args)) = self.tokenize(&message.text) else {
            return;
        };
        debug!(author = %message.author, command = %command, "inbound command");

        let dispatcher = self.dispatcher.clone();
        let task = tokio::spawn(async move {
            let reply = dispatcher.dispatch(&command, &args, &channel).await;
            if let Err(e) = channel.send(reply).await {
                error!(command = %command, "failed to send reply: {e:#}");
            }
        });

        if let Err(e) = task.await {
            error!("unhandled fault while handling message from {}: {e}", message.author);
        }
    }
}
