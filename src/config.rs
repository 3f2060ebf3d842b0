use std::{path::Path, time::Duration};

use serde::Deserialize;
use structopt::StructOpt;
use twitch_api2::twitch_oauth2::{ClientId, ClientSecret};

use crate::errors::{Error, Result};

const DEFAULT_CHECK_INTERVAL_SECS: u64 = 5 * 60;

#[derive(Deserialize)]
#[serde(transparent)]
pub struct Obfuscated(pub String);

impl std::fmt::Debug for Obfuscated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<Obfuscated string>")?;
        Ok(())
    }
}

impl std::clone::Clone for Obfuscated {
    fn clone(&self) -> Self {
        Obfuscated(self.0.clone())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub twitch_client_id: ClientId,
    pub twitch_client_secret: ClientSecret,
    pub discord_bot_token: Obfuscated,
    /// id of the discord channel where notifications go
    pub discord_channel: String,
    /// exact twitch category name, like "Factorio"
    pub game_name: String,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

impl Config {
    pub fn from_path<P>(config_path: P) -> Result<Config>
    where
        P: AsRef<Path>,
    {
        let config: Config = serde_dhall::from_file(config_path).parse()?;
        config.validate()
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    fn validate(self) -> Result<Self> {
        if self.twitch_client_id.as_str().is_empty() {
            return Err(Error::ConfigMissing("TWITCH_CLIENT_ID"));
        }
        if self.twitch_client_secret.secret().is_empty() {
            return Err(Error::ConfigMissing("TWITCH_CLIENT_SECRET"));
        }
        if self.discord_bot_token.0.is_empty() {
            return Err(Error::ConfigMissing("DISCORD_BOT_TOKEN"));
        }
        if self.discord_channel.is_empty() {
            return Err(Error::ConfigMissing("DISCORD_TWITCH_CHANNEL"));
        }
        if self.game_name.is_empty() {
            return Err(Error::ConfigMissing("GAME_NAME"));
        }
        if self.check_interval_secs == 0 {
            return Err(Error::ConfigMissing("CHECK_INTERVAL_SECS"));
        }
        Ok(self)
    }
}

/// Configuration values given on the command line or through the environment.
/// Every value is optional here so that a missing one can be reported by name.
#[derive(Debug, StructOpt)]
pub struct ConfigArgs {
    #[structopt(long, env = "TWITCH_CLIENT_ID", hide_env_values = true)]
    pub twitch_client_id: Option<String>,

    #[structopt(long, env = "TWITCH_CLIENT_SECRET", hide_env_values = true)]
    pub twitch_client_secret: Option<String>,

    #[structopt(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    pub discord_bot_token: Option<String>,

    #[structopt(long, env = "DISCORD_TWITCH_CHANNEL")]
    pub discord_channel: Option<String>,

    #[structopt(long, env = "GAME_NAME")]
    pub game_name: Option<String>,

    /// seconds between two checks of the live streams
    #[structopt(long, env = "CHECK_INTERVAL_SECS", default_value = "300")]
    pub check_interval_secs: u64,
}

impl Default for ConfigArgs {
    fn default() -> Self {
        ConfigArgs {
            twitch_client_id: None,
            twitch_client_secret: None,
            discord_bot_token: None,
            discord_channel: None,
            game_name: None,
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
        }
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(Error::ConfigMissing(name))
}

impl ConfigArgs {
    pub fn into_config(self) -> Result<Config> {
        let config = Config {
            twitch_client_id: ClientId::new(required(self.twitch_client_id, "TWITCH_CLIENT_ID")?),
            twitch_client_secret: ClientSecret::new(required(
                self.twitch_client_secret,
                "TWITCH_CLIENT_SECRET",
            )?),
            discord_bot_token: Obfuscated(required(self.discord_bot_token, "DISCORD_BOT_TOKEN")?),
            discord_channel: required(self.discord_channel, "DISCORD_TWITCH_CHANNEL")?,
            game_name: required(self.game_name, "GAME_NAME")?,
            check_interval_secs: self.check_interval_secs,
        };
        config.validate()
    }
}
