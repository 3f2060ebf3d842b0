use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use log::info;
use structopt::StructOpt;

mod config;
mod discord;
mod errors;
mod notifier;
mod presence;
mod scheduler;
mod stream;
mod twitch;

use config::{Config, ConfigArgs};
use discord::DiscordClient;
use scheduler::{WatchSettings, Watcher};
use twitch::HelixSource;

/// Announce on discord the twitch streams of a given game
#[derive(Debug, StructOpt)]
struct Opt {
    /// read the whole configuration from this dhall file instead
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    #[structopt(flatten)]
    args: ConfigArgs,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opt = Opt::from_args();
    let config = match &opt.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("Cannot read config from {}", path.display()))?,
        None => opt.args.into_config().context("Missing required configuration")?,
    };
    info!("Watching twitch streams for {}", config.game_name);

    let source = HelixSource::new_from_config(&config)
        .await
        .context("Cannot connect to twitch")?;
    let chat = DiscordClient::new(config.discord_bot_token.clone());
    let watcher = Watcher::new(
        source,
        chat,
        WatchSettings {
            game_name: config.game_name.clone(),
            channel: config.discord_channel.clone(),
            interval: config.check_interval(),
        },
    );

    tokio::select! {
        res = watcher.run() => {
            res.context("Stream watcher crashed")?;
            Err(anyhow!("Stream watcher exited!"))
        }
        res = tokio::signal::ctrl_c() => {
            res.context("Cannot listen for shutdown signal")?;
            info!("Shutting down");
            Ok(())
        }
    }
}
