use async_trait::async_trait;
use twitch_api2::{
    helix::{
        self,
        games::get_games,
        streams::{self, Stream},
        ClientRequestError, HelixRequestGetError,
    },
    twitch_oauth2::{AppAccessToken, ClientId, ClientSecret, TwitchToken},
    types::CategoryId,
    HelixClient,
};

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::stream::{Category, StreamRecord};
use crate::twitch::token::{TokenCache, TokenProvider};
use crate::twitch::StreamSource;

/// Maximum page size accepted by helix
const PAGE_SIZE: usize = 100;

/// Client credentials flow, app tokens last about 60 days
/// and come without a refresh token.
pub struct AppTokenProvider {
    // The auth client is kept separate from the helix one, sharing the
    // same http client for both trips higher ranked lifetime errors in rustc.
    // https://github.com/rust-lang/rust/issues/70263
    auth_client: reqwest::Client,
    client_id: ClientId,
    client_secret: ClientSecret,
}

#[async_trait]
impl TokenProvider for AppTokenProvider {
    type Token = AppAccessToken;

    async fn fetch_token(&self) -> Result<AppAccessToken> {
        let token = AppAccessToken::get_app_access_token(
            &self.auth_client,
            self.client_id.clone(),
            self.client_secret.clone(),
            vec![], // scopes
        )
        .await
        .map_err(|e| Error::auth(e, "Cannot get twitch app access token"))?;
        log::info!("Got a twitch app access token");
        Ok(token)
    }

    fn is_elapsed(token: &AppAccessToken) -> bool {
        token.is_elapsed()
    }
}

pub struct HelixSource {
    client: HelixClient<'static, reqwest::Client>,
    token: TokenCache<AppTokenProvider>,
}

impl std::fmt::Debug for HelixSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelixSource")
            .field("client", &"<HelixClient>")
            .finish()
    }
}

fn is_unauthorized(err: &ClientRequestError<reqwest::Error>) -> bool {
    match err {
        ClientRequestError::HelixRequestGetError(HelixRequestGetError::Error {
            status, ..
        }) => status.as_u16() == 401,
        _ => false,
    }
}

impl HelixSource {
    pub async fn new_from_config(config: &Config) -> Result<Self> {
        let provider = AppTokenProvider {
            auth_client: reqwest::Client::default(),
            client_id: config.twitch_client_id.clone(),
            client_secret: config.twitch_client_secret.clone(),
        };

        Ok(HelixSource {
            client: HelixClient::new(),
            token: TokenCache::new(provider).await?,
        })
    }

    async fn get_streams_page(
        &self,
        category: &Category,
        after: Option<helix::Cursor>,
    ) -> Result<(Vec<Stream>, Option<helix::Cursor>)> {
        let mut req = streams::GetStreamsRequest::builder()
            .game_id(vec![CategoryId::from(category.id.clone())])
            .build();
        req.first = Some(PAGE_SIZE);
        req.after = after;

        let resp = self
            .token
            .authorized(
                |token| {
                    let req = req.clone();
                    async move { self.client.req_get(req, &*token).await }
                },
                is_unauthorized,
            )
            .await?
            .map_err(|e| {
                Error::fetch(e, format!("Can't get live streams for {}", &category.name))
            })?;

        Ok((resp.data, resp.pagination))
    }
}

#[async_trait]
impl StreamSource for HelixSource {
    async fn resolve_category(&self, name: &str) -> Result<Category> {
        let req = get_games::GetGamesRequest::builder()
            .name(vec![name.to_string()])
            .build();
        let mut resp = self
            .token
            .authorized(
                |token| {
                    let req = req.clone();
                    async move { self.client.req_get(req, &*token).await }
                },
                is_unauthorized,
            )
            .await?
            .map_err(|e| Error::fetch(e, format!("Can't look up category {}", name)))?;

        match resp.data.pop() {
            None => Err(Error::CategoryNotFound(name.to_string())),
            Some(game) => Ok(Category {
                name: game.name,
                id: game.id.to_string(),
            }),
        }
    }

    async fn list_active_streams(&self, category: &Category) -> Result<Vec<StreamRecord>> {
        let mut records = Vec::new();
        let mut after = None;
        loop {
            let (streams, cursor) = self.get_streams_page(category, after).await?;
            let page_len = streams.len();
            records.extend(streams.into_iter().map(stream_record));

            // an empty page can still come with a cursor
            match cursor {
                Some(cursor) if page_len > 0 => after = Some(cursor),
                _ => break,
            }
        }
        Ok(records)
    }
}

fn stream_record(stream: Stream) -> StreamRecord {
    StreamRecord {
        display_name: stream.user_name.to_string(),
        login: stream.user_login.to_string(),
        viewer_count: stream.viewer_count,
        thumbnail_url: stream.thumbnail_url,
    }
}
