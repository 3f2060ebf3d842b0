//! Just enough of the discord gateway to identify the bot once.
//! Discord refuses messages from a bot which never connected to the gateway,
//! and READY is the signal that the bot is logged in.

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::errors::{Error, Result};

const GATEWAY_VERSION: u8 = 10;

// https://discord.com/developers/docs/topics/opcodes-and-status-codes#gateway-gateway-opcodes
const OP_DISPATCH: u8 = 0;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;

const INTENT_GUILDS: u64 = 1;

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    d: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Ready {
    user: ReadyUser,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ReadyUser {
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
}

impl std::fmt::Display for ReadyUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.discriminator.as_deref() {
            None | Some("0") => write!(f, "{}", self.username),
            Some(d) => write!(f, "{}#{}", self.username, d),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Step {
    Identify,
    Ready(ReadyUser),
    Wait,
}

fn next_step(payload: GatewayPayload) -> Result<Step> {
    match payload.op {
        OP_HELLO => Ok(Step::Identify),
        OP_DISPATCH if payload.t.as_deref() == Some("READY") => {
            let ready: Ready = serde_json::from_value(payload.d)
                .map_err(|e| Error::auth(e, "Unexpected READY payload"))?;
            Ok(Step::Ready(ready.user))
        }
        OP_INVALID_SESSION | OP_RECONNECT => Err(Error::auth(
            format!("gateway opcode {}", payload.op),
            "Discord gateway refused the session",
        )),
        _ => Ok(Step::Wait),
    }
}

fn identify_payload(token: &str) -> serde_json::Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENT_GUILDS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "streamwatch",
                "device": "streamwatch",
            },
        },
    })
}

/// Connect to the gateway at `url`, identify with the bot token and wait
/// for READY. The connection is closed afterwards, messages go through
/// the REST api.
pub async fn identify(url: &str, token: &str) -> Result<ReadyUser> {
    let url = format!(
        "{}/?v={}&encoding=json",
        url.trim_end_matches('/'),
        GATEWAY_VERSION
    );
    let (mut ws, _) = connect_async(url.as_str())
        .await
        .map_err(|e| Error::auth(e, "Cannot connect to the discord gateway"))?;

    while let Some(msg) = ws.next().await {
        let msg = msg.map_err(|e| Error::auth(e, "Discord gateway connection failed"))?;
        let payload: GatewayPayload = match msg {
            Message::Text(text) => serde_json::from_str(&text)
                .map_err(|e| Error::auth(e, "Unexpected discord gateway payload"))?,
            Message::Close(frame) => {
                // 4004 is a bad token
                return Err(Error::auth(
                    format!("{:?}", frame),
                    "Discord gateway closed the connection",
                ));
            }
            _ => continue,
        };

        match next_step(payload)? {
            Step::Identify => {
                log::debug!("Identifying on the discord gateway");
                ws.send(Message::Text(identify_payload(token).to_string()))
                    .await
                    .map_err(|e| Error::auth(e, "Cannot identify on the discord gateway"))?;
            }
            Step::Ready(user) => {
                if let Err(err) = ws.close(None).await {
                    log::debug!("Error closing the discord gateway: {}", err);
                }
                return Ok(user);
            }
            Step::Wait => (),
        }
    }

    Err(Error::auth(
        "connection closed",
        "Discord gateway closed before READY",
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn payload(json: &str) -> GatewayPayload {
        serde_json::from_str(json).expect("gateway payload")
    }

    #[test]
    fn test_hello_triggers_identify() {
        let hello = payload(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#);
        assert_eq!(next_step(hello).unwrap(), Step::Identify);
    }

    #[test]
    fn test_ready() {
        let ready = payload(
            r#"{"op":0,"s":1,"t":"READY","d":{"v":10,"session_id":"abc","user":{"id":"80351110224678912","username":"golem","discriminator":"0","bot":true},"guilds":[]}}"#,
        );
        let user = match next_step(ready).unwrap() {
            Step::Ready(user) => user,
            step => panic!("expected READY, got {:?}", step),
        };
        assert_eq!(user.username, "golem");
        assert_eq!(user.to_string(), "golem");
    }

    #[test]
    fn test_legacy_discriminator_shown() {
        let user = ReadyUser {
            username: "golem".to_string(),
            discriminator: Some("4242".to_string()),
        };
        assert_eq!(user.to_string(), "golem#4242");
    }

    #[test]
    fn test_other_events_ignored() {
        let ack = payload(r#"{"op":11}"#);
        assert_eq!(next_step(ack).unwrap(), Step::Wait);

        let guild = payload(r#"{"op":0,"s":2,"t":"GUILD_CREATE","d":{"id":"1"}}"#);
        assert_eq!(next_step(guild).unwrap(), Step::Wait);
    }

    #[test]
    fn test_invalid_session_fails() {
        let invalid = payload(r#"{"op":9,"d":false}"#);
        assert!(matches!(next_step(invalid), Err(Error::Auth { .. })));
    }

    #[test]
    fn test_identify_payload() {
        let identify = identify_payload("bot-token");
        assert_eq!(identify["op"], json!(2));
        assert_eq!(identify["d"]["token"], json!("bot-token"));
        assert_eq!(identify["d"]["intents"], json!(1));
        assert_eq!(identify["d"]["properties"]["browser"], json!("streamwatch"));
    }
}
