use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::discord::{ChatClient, CreateMessage, Embed, EmbedField, EmbedFooter, EmbedThumbnail};
use crate::errors::Result;
use crate::stream::StreamRecord;

/// twitch purple
const EMBED_COLOR: u32 = 0x6441A4;
const THUMBNAIL_WIDTH: u32 = 320;
const THUMBNAIL_HEIGHT: u32 = 180;

pub fn format_notification(
    stream: &StreamRecord,
    game_name: &str,
    now: OffsetDateTime,
) -> CreateMessage {
    let embed = Embed {
        title: Some(format!(
            "{} is now streaming {}",
            stream.display_name, game_name
        )),
        url: Some(stream.url()),
        description: Some(format!("🎮 New stream alert for {}!", game_name)),
        color: Some(EMBED_COLOR),
        fields: vec![
            EmbedField {
                name: "Streamer".to_string(),
                value: stream.display_name.clone(),
                inline: true,
            },
            EmbedField {
                name: "Viewers".to_string(),
                value: stream.viewer_count.to_string(),
                inline: true,
            },
        ],
        thumbnail: Some(EmbedThumbnail {
            url: stream.thumbnail(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT),
        }),
        footer: Some(EmbedFooter {
            text: "Twitch Stream Notification".to_string(),
        }),
        timestamp: now.format(&Rfc3339).ok(),
    };

    CreateMessage {
        embeds: vec![embed],
    }
}

/// Send a notification for the given stream. Nothing is retried, the caller
/// only gets the error to log it.
pub async fn notify<C>(
    chat: &C,
    channel: &C::Channel,
    stream: &StreamRecord,
    game_name: &str,
) -> Result<()>
where
    C: ChatClient,
{
    let message = format_notification(stream, game_name, OffsetDateTime::now_utc());
    chat.send(channel, &message).await?;
    log::info!(
        "Sent Discord notification: {} is streaming {}",
        stream.display_name,
        game_name
    );
    Ok(())
}
