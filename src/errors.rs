use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing required configuration value {0}")]
    ConfigMissing(&'static str),

    #[error("Cannot read config file")]
    Config(#[from] serde_dhall::Error),

    #[error("Authentication failed: {ctx}")]
    Auth { source: BoxedError, ctx: String },

    #[error("Category {0} not found")]
    CategoryNotFound(String),

    #[error("Cannot fetch streams: {ctx}")]
    Fetch { source: BoxedError, ctx: String },

    #[error("Discord channel {0} is unavailable")]
    ChannelUnavailable(String),

    #[error("Cannot send notification: {ctx}")]
    Dispatch { source: BoxedError, ctx: String },
}

impl Error {
    pub fn auth<E, S>(source: E, ctx: S) -> Self
    where
        E: Into<BoxedError>,
        S: Into<String>,
    {
        Error::Auth {
            source: source.into(),
            ctx: ctx.into(),
        }
    }

    pub fn fetch<E, S>(source: E, ctx: S) -> Self
    where
        E: Into<BoxedError>,
        S: Into<String>,
    {
        Error::Fetch {
            source: source.into(),
            ctx: ctx.into(),
        }
    }

    pub fn dispatch<E, S>(source: E, ctx: S) -> Self
    where
        E: Into<BoxedError>,
        S: Into<String>,
    {
        Error::Dispatch {
            source: source.into(),
            ctx: ctx.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
