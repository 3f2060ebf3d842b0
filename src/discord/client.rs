use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Obfuscated;
use crate::discord::{gateway, ChatClient, CreateMessage};
use crate::errors::{Error, Result};

const API_BASE: &str = "https://discord.com/api/v10";

// https://discord.com/developers/docs/resources/channel#channel-object-channel-types
const GUILD_TEXT: u8 = 0;
const GUILD_ANNOUNCEMENT: u8 = 5;

#[derive(Debug, Deserialize)]
struct GatewayBot {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChannelResponse {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: u8,
}

/// A discord channel notifications can be posted to
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

/// Bot client for the discord REST api.
#[derive(Debug)]
pub struct DiscordClient {
    http: reqwest::Client,
    token: Obfuscated,
}

impl DiscordClient {
    pub fn new(token: Obfuscated) -> Self {
        DiscordClient {
            http: reqwest::Client::new(),
            token,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", API_BASE, path))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token.0)
    }
}

#[async_trait]
impl ChatClient for DiscordClient {
    type Channel = Channel;

    async fn await_ready(&self) -> Result<()> {
        // also checks the token before opening the websocket
        let gateway: GatewayBot = self
            .get("/gateway/bot")
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| Error::auth(e, "Cannot log in to discord"))?
            .json()
            .await
            .map_err(|e| Error::auth(e, "Unexpected discord gateway payload"))?;

        let user = gateway::identify(&gateway.url, &self.token.0).await?;
        log::info!("Logged in as {}!", user);
        Ok(())
    }

    async fn resolve_channel(&self, handle: &str) -> Result<Channel> {
        let resp = self
            .get(&format!("/channels/{}", handle))
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        let resp = match resp {
            Ok(resp) => resp,
            Err(err) => {
                log::debug!("Cannot fetch discord channel {}: {}", handle, err);
                return Err(Error::ChannelUnavailable(handle.to_string()));
            }
        };

        let channel: ChannelResponse = resp.json().await.map_err(|err| {
            log::debug!("Unexpected channel payload for {}: {}", handle, err);
            Error::ChannelUnavailable(handle.to_string())
        })?;
        text_channel(channel).ok_or_else(|| Error::ChannelUnavailable(handle.to_string()))
    }

    async fn send(&self, channel: &Channel, message: &CreateMessage) -> Result<()> {
        self.http
            .post(format!("{}/channels/{}/messages", API_BASE, channel.id))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(message)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| Error::dispatch(e, format!("can't send message to #{}", channel.name)))?;
        Ok(())
    }
}

/// Only channels where messages can be posted are accepted
fn text_channel(channel: ChannelResponse) -> Option<Channel> {
    match channel.kind {
        GUILD_TEXT | GUILD_ANNOUNCEMENT => Some(Channel {
            name: channel.name.unwrap_or_else(|| channel.id.clone()),
            id: channel.id,
        }),
        kind => {
            log::debug!(
                "Discord channel {} has type {} and cannot receive notifications",
                channel.id,
                kind
            );
            None
        }
    }
}
