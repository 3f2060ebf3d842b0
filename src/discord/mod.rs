use async_trait::async_trait;

use crate::errors::Result;

mod client;
mod gateway;
mod message;

pub use client::DiscordClient;
pub use message::{CreateMessage, Embed, EmbedField, EmbedFooter, EmbedThumbnail};

/// Something able to deliver messages to a chat channel.
#[async_trait]
pub trait ChatClient: Sync + Send {
    /// A channel resolved from its handle
    type Channel: std::fmt::Debug + Sync + Send;

    /// Completes once the client is logged in and can be used.
    /// For discord this means the bot identified on the gateway, discord
    /// rejects messages from bots which never did.
    async fn await_ready(&self) -> Result<()>;

    async fn resolve_channel(&self, handle: &str) -> Result<Self::Channel>;

    async fn send(&self, channel: &Self::Channel, message: &CreateMessage) -> Result<()>;
}
