//! An opaque capability set over the upstream API, retried and
//! quota-accounted, exposed as two traits so every consumer (discovery,
//! trending, inventory, panel) can be unit-tested against a mock without
//! touching the network.

pub mod live;
mod quota;
mod retry;

pub use live::YoutubeDataApiProvider;
pub use quota::QuotaLog;
pub use retry::with_retry;

use crate::extras::{ExtrasBag, SearchOrder};
pub use crate::errors::{ProviderError, RetryClass};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub published_after: DateTime<Utc>,
    pub published_before: DateTime<Utc>,
    pub order: SearchOrder,
    pub page_token: Option<String>,
    pub extras: ExtrasBag,
}

#[derive(Debug, Clone)]
pub struct SearchItem {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub published_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub items: Vec<SearchItem>,
    pub next_page_token: Option<String>,
}

impl SearchPage {
    pub fn quota_cost() -> u32 {
        100
    }
}

#[derive(Debug, Clone)]
pub struct ChannelResource {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub custom_url: Option<String>,
    pub published_at: Option<String>,
    pub view_count: Option<i64>,
    pub subscriber_count: Option<i64>,
    pub video_count: Option<i64>,
    pub country: Option<String>,
    pub default_language: Option<String>,
    pub topic_ids: Vec<String>,
    pub made_for_kids: Option<bool>,
    pub privacy_status: Option<String>,
    pub longuploads_status: Option<String>,
    pub branding_keywords: Vec<String>,
    pub localizations: Vec<String>,
    pub uploads_playlist_id: Option<String>,
}

/// `ChannelResult = {Found(Channel) | NotFound(id)}`: a missing channel is
/// an ordinary outcome of a batch lookup, not an error.
#[derive(Debug, Clone)]
pub enum ChannelResult {
    Found(ChannelResource),
    NotFound { id: String },
}

#[derive(Debug, Clone)]
pub struct VideoResource {
    pub video_id: String,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub duration_seconds: Option<u64>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum VideoResult {
    Found(VideoResource),
    NotFound { id: String },
}

#[derive(Debug, Clone)]
pub struct PlaylistItem {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistItem>,
    pub next_page_token: Option<String>,
}

/// Search capability: keyword/window search plus the regional "most popular"
/// chart.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search_videos(&self, req: SearchRequest) -> Result<SearchPage, ProviderError>;
    async fn most_popular(
        &self,
        region_code: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, ProviderError>;
}

/// Detail/enumeration capability: batch channel lookup, batch video lookup,
/// and playlist-item paging.
///
/// Implementors chunk internally: no call this trait wraps may request more
/// than [`crate::config::MAX_RESULTS_PER_PAGE`] ids at once, but callers may
/// pass arbitrarily long id lists.
#[async_trait]
pub trait DetailProvider: Send + Sync {
    async fn list_channels(&self, ids: &[String]) -> Result<Vec<ChannelResult>, ProviderError>;
    async fn list_videos(&self, ids: &[String]) -> Result<Vec<VideoResult>, ProviderError>;
    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistPage, ProviderError>;
}

/// Splits a list into chunks of at most `n`, so callers can transparently
/// batch arbitrarily long id lists and concatenate the results.
pub fn chunks<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    items.chunks(n.max(1)).map(|c| c.to_vec()).collect()
}

/// In-memory providers for tests; kept unconditional (not `cfg(test)`) so
/// integration tests under `tests/` can depend on them too.
pub mod mock;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_splits_at_boundary() {
        let ids: Vec<i32> = (0..51).collect();
        let chunked = chunks(&ids, 50);
        assert_eq!(chunked.len(), 2);
        assert_eq!(chunked[0].len(), 50);
        assert_eq!(chunked[1].len(), 1);
    }

    #[test]
    fn chunks_of_empty_list_is_empty() {
        let ids: Vec<i32> = vec![];
        assert!(chunks(&ids, 50).is_empty());
    }
}
