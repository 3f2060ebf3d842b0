use async_trait::async_trait;

use crate::errors::Result;
use crate::stream::{Category, StreamRecord};

mod client;
mod token;

pub use client::HelixSource;

/// Where live streams come from.
#[async_trait]
pub trait StreamSource: Sync + Send {
    /// Look up the category with the exact given name.
    /// Fails with `Error::CategoryNotFound` if twitch doesn't know about it.
    async fn resolve_category(&self, name: &str) -> Result<Category>;

    /// All the streams currently live for the given category.
    async fn list_active_streams(&self, category: &Category) -> Result<Vec<StreamRecord>>;
}
