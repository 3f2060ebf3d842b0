use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::discord::ChatClient;
use crate::errors::{Error, Result};
use crate::notifier;
use crate::presence::PresenceTracker;
use crate::stream::Category;
use crate::twitch::StreamSource;

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub game_name: String,
    /// discord channel id
    pub channel: String,
    pub interval: Duration,
}

/// What's known once the startup handshake is done.
#[derive(Debug)]
struct Session<Ch> {
    category: Category,
    // None if the channel couldn't be resolved, in which case
    // nothing can be sent but streams are still tracked.
    channel: Option<Ch>,
}

/// Summary of one tick, mostly useful to observe the loop.
#[derive(Debug, Default, PartialEq)]
pub struct TickReport {
    pub live: usize,
    pub notified: Vec<String>,
    pub failed: Vec<String>,
    pub departed: Vec<String>,
}

pub struct Watcher<S, C> {
    source: S,
    chat: C,
    settings: WatchSettings,
    tracker: PresenceTracker,
}

impl<S, C> Watcher<S, C>
where
    S: StreamSource,
    C: ChatClient,
{
    pub fn new(source: S, chat: C, settings: WatchSettings) -> Self {
        Watcher {
            source,
            chat,
            settings,
            tracker: PresenceTracker::new(),
        }
    }

    /// Wait for the chat client, then check the streams forever.
    /// Only returns if the startup fails.
    pub async fn run(mut self) -> Result<()> {
        let session = self.start().await?;

        // the first tick completes immediately
        let mut interval = time::interval(self.settings.interval);
        // after a tick slower than the interval, the overdue tick fires at
        // once and the following ones go back to multiples of the period
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.tick(&session).await;
        }
    }

    async fn start(&self) -> Result<Session<C::Channel>> {
        self.chat.await_ready().await?;

        let channel = match self.chat.resolve_channel(&self.settings.channel).await {
            Ok(channel) => {
                log::info!("Notifications will be sent to {:?}", channel);
                Some(channel)
            }
            Err(err) => {
                log::warn!("{}, no notification will be sent", err);
                None
            }
        };

        let category = self
            .source
            .resolve_category(&self.settings.game_name)
            .await?;
        log::info!("Watching category {} ({})", category.name, category.id);

        Ok(Session { category, channel })
    }

    /// One fetch, reconcile and dispatch cycle. Errors never escape a tick.
    async fn tick(&mut self, session: &Session<C::Channel>) -> Option<TickReport> {
        let snapshot = match self.source.list_active_streams(&session.category).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::error!("Error checking streams: {}", err);
                return None;
            }
        };
        log::info!("{} streamers", snapshot.len());

        let mut report = TickReport {
            live: snapshot.len(),
            ..TickReport::default()
        };
        let reconciliation = self.tracker.reconcile(snapshot);

        for name in &reconciliation.departed {
            log::info!(
                "Removed {} from cache as they're no longer streaming {}",
                name,
                session.category.name
            );
        }
        report.departed = reconciliation.departed;

        for stream in &reconciliation.arrived {
            let sent = match &session.channel {
                None => Err(Error::ChannelUnavailable(self.settings.channel.clone())),
                Some(channel) => {
                    notifier::notify(&self.chat, channel, stream, &session.category.name).await
                }
            };
            match sent {
                Ok(()) => report.notified.push(stream.display_name.clone()),
                Err(err) => {
                    log::error!(
                        "Error during discord notification for {}: {}",
                        stream.display_name,
                        err
                    );
                    report.failed.push(stream.display_name.clone());
                }
            }
        }

        log::debug!("{} streamers already notified", self.tracker.len());
        Some(report)
    }
}
