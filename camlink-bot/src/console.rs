//! Console chat adapter
//!
//! Runs the relay without a chat platform: each stdin line is a message from
//! the local operator, replies go to stdout and attachments are written to
//! the capture directory.

use crate::chat::{InboundMessage, MessageRouter, Reply, ReplyChannel, SharedChannel};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

pub struct ConsoleChannel {
    capture_dir: PathBuf,
}

impl ConsoleChannel {
    pub fn new(capture_dir: impl Into<PathBuf>) -> Self {
        Self { capture_dir: capture_dir.into() }
    }
}

#[async_trait]
impl ReplyChannel for ConsoleChannel {
    async fn send(&self, reply: Reply) -> Result<()> {
        println!("{}", reply.text);

        if let Some(attachment) = reply.attachment {
            tokio::fs::create_dir_all(&self.capture_dir)
                .await
                .with_context(|| format!("creating {}", self.capture_dir.display()))?;
            let path = self.capture_dir.join(&attachment.filename);
            tokio::fs::write(&path, &attachment.bytes)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            println!("📎 {} ({} bytes)", path.display(), attachment.bytes.len());
        }
        Ok(())
    }
}

/// Feeds stdin lines to the router until end of input.
pub async fn run(router: &MessageRouter, channel: SharedChannel) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let message = InboundMessage {
            author: "console".to_string(),
            author_is_bot: false,
            text: line,
        };
        router.handle(message, channel.clone()).await;
    }
    info!("stdin closed, console adapter stopping");
    Ok(())
}
