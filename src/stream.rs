/// A twitch category (game), resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// opaque helix identifier
    pub id: String,
}

/// One live stream as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    /// what twitch shows as the streamer name, also the identity
    /// used to track notified streams.
    pub display_name: String,
    /// login is what appears in the URL at www.twitch.tv/<login>
    pub login: String,
    pub viewer_count: usize,
    /// contains `{width}` and `{height}` placeholders
    pub thumbnail_url: String,
}

impl StreamRecord {
    pub fn url(&self) -> String {
        format!("https://twitch.tv/{}", self.login)
    }

    pub fn thumbnail(&self, width: u32, height: u32) -> String {
        self.thumbnail_url
            .replace("{width}", &width.to_string())
            .replace("{height}", &height.to_string())
    }
}
