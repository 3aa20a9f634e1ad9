//! Live implementation of [`super::SearchProvider`] and [`super::DetailProvider`]
//! against the real upstream Data API, over a process-wide shared [`reqwest::Client`]
//! (the same lazily-initialized-singleton shape as `http_client_for_url`).

use super::{
    chunks, ChannelResource, ChannelResult, DetailProvider, PlaylistItem, PlaylistPage,
    SearchItem, SearchPage, SearchProvider, SearchRequest, VideoResource, VideoResult,
};
use crate::config::MAX_RESULTS_PER_PAGE;
use crate::duration::parse_iso8601_duration;
use crate::errors::ProviderError;
use crate::provider::quota::QuotaLog;
use crate::provider::retry::with_retry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(45))
            .user_agent("youtube-panel-collector")
            .build()
            .expect("reqwest client must build with static config")
    })
}

pub struct YoutubeDataApiProvider {
    api_key: String,
    quota: Arc<QuotaLog>,
    sleep_between_calls: Duration,
}

impl YoutubeDataApiProvider {
    pub fn new(api_key: String, quota: Arc<QuotaLog>, sleep_between_calls_ms: u64) -> Self {
        YoutubeDataApiProvider {
            api_key,
            quota,
            sleep_between_calls: Duration::from_millis(sleep_between_calls_ms),
        }
    }

    async fn throttle(&self) {
        tokio::time::sleep(self.sleep_between_calls).await;
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ProviderError> {
        let client = shared_client();
        let url = format!("{BASE_URL}/{path}");
        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("key", self.api_key.clone()));

        let response = client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ProviderError::TransientNetwork(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Value>()
                .await
                .map_err(|e| ProviderError::TransientNetwork(format!("invalid json body: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        let code = status.as_u16();
        if code == 403 || code == 429 || code == 500 || code == 503 {
            Err(ProviderError::TransientHttp { status: code, message: body })
        } else {
            Err(ProviderError::Terminal { status: code, message: body })
        }
    }

    fn search_quota_cost(&self) -> u32 {
        SearchPage::quota_cost()
    }
}

fn parse_search_items(payload: &Value) -> Vec<SearchItem> {
    payload
        .get("items")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let video_id = item.get("id")?.get("videoId")?.as_str()?.to_string();
            let snippet = item.get("snippet")?;
            let channel_id = snippet.get("channelId")?.as_str()?.to_string();
            let title = snippet.get("title")?.as_str().unwrap_or_default().to_string();
            let published_at = snippet.get("publishedAt")?.as_str().unwrap_or_default().to_string();
            Some(SearchItem { video_id, channel_id, title, published_at })
        })
        .collect()
}

fn parse_next_page_token(payload: &Value) -> Option<String> {
    payload.get("nextPageToken").and_then(Value::as_str).map(str::to_string)
}

fn parse_channel_resource(item: &Value) -> Option<ChannelResource> {
    let channel_id = item.get("id")?.as_str()?.to_string();
    let snippet = item.get("snippet");
    let statistics = item.get("statistics");
    let topic_details = item.get("topicDetails");
    let status = item.get("status");
    let branding = item.get("brandingSettings");
    let content_details = item.get("contentDetails");

    let title = snippet
        .and_then(|s| s.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let description = snippet
        .and_then(|s| s.get("description"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let topic_ids = topic_details
        .and_then(|t| t.get("topicIds"))
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default();

    let branding_keywords = branding
        .and_then(|b| b.get("channel"))
        .and_then(|c| c.get("keywords"))
        .and_then(Value::as_str)
        .map(|s| s.split_whitespace().map(String::from).collect())
        .unwrap_or_default();

    let localizations = item
        .get("localizations")
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();

    Some(ChannelResource {
        channel_id,
        title,
        description,
        custom_url: snippet.and_then(|s| s.get("customUrl")).and_then(Value::as_str).map(String::from),
        published_at: snippet.and_then(|s| s.get("publishedAt")).and_then(Value::as_str).map(String::from),
        view_count: statistics.and_then(|s| s.get("viewCount")).and_then(Value::as_str).and_then(|s| s.parse().ok()),
        subscriber_count: statistics
            .and_then(|s| s.get("subscriberCount"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
        video_count: statistics.and_then(|s| s.get("videoCount")).and_then(Value::as_str).and_then(|s| s.parse().ok()),
        country: snippet.and_then(|s| s.get("country")).and_then(Value::as_str).map(String::from),
        default_language: snippet.and_then(|s| s.get("defaultLanguage")).and_then(Value::as_str).map(String::from),
        topic_ids,
        made_for_kids: status.and_then(|s| s.get("madeForKids")).and_then(Value::as_bool),
        privacy_status: status.and_then(|s| s.get("privacyStatus")).and_then(Value::as_str).map(String::from),
        longuploads_status: status.and_then(|s| s.get("longUploadsStatus")).and_then(Value::as_str).map(String::from),
        branding_keywords,
        localizations,
        uploads_playlist_id: content_details
            .and_then(|c| c.get("relatedPlaylists"))
            .and_then(|p| p.get("uploads"))
            .and_then(Value::as_str)
            .map(String::from),
    })
}

fn parse_video_resource(item: &Value) -> Option<VideoResource> {
    let video_id = item.get("id")?.as_str()?.to_string();
    let statistics = item.get("statistics");
    let content_details = item.get("contentDetails");
    let snippet = item.get("snippet");

    let duration_seconds = content_details
        .and_then(|c| c.get("duration"))
        .and_then(Value::as_str)
        .map(parse_iso8601_duration);

    Some(VideoResource {
        video_id,
        view_count: statistics.and_then(|s| s.get("viewCount")).and_then(Value::as_str).and_then(|s| s.parse().ok()),
        like_count: statistics.and_then(|s| s.get("likeCount")).and_then(Value::as_str).and_then(|s| s.parse().ok()),
        comment_count: statistics
            .and_then(|s| s.get("commentCount"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
        duration_seconds,
        category_id: snippet.and_then(|s| s.get("categoryId")).and_then(Value::as_str).map(String::from),
    })
}

fn parse_playlist_items(payload: &Value) -> Vec<PlaylistItem> {
    payload
        .get("items")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let snippet = item.get("snippet")?;
            let video_id = snippet.get("resourceId")?.get("videoId")?.as_str()?.to_string();
            let title = snippet.get("title")?.as_str().unwrap_or_default().to_string();
            let published_at = snippet.get("publishedAt")?.as_str().unwrap_or_default().to_string();
            Some(PlaylistItem { video_id, title, published_at })
        })
        .collect()
}

#[async_trait]
impl SearchProvider for YoutubeDataApiProvider {
    async fn search_videos(&self, req: SearchRequest) -> Result<SearchPage, ProviderError> {
        let mut params: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("maxResults", MAX_RESULTS_PER_PAGE.to_string()),
            ("q", req.query.clone()),
            ("order", req.order.as_api_value().to_string()),
            ("publishedAfter", req.published_after.to_rfc3339()),
            ("publishedBefore", req.published_before.to_rfc3339()),
        ];
        if let Some(token) = &req.page_token {
            params.push(("pageToken", token.clone()));
        }
        params.extend(req.extras.as_query_pairs());

        let payload = with_retry(|| self.get_json("search", &params)).await?;
        self.throttle().await;
        self.quota.record("search.list", self.search_quota_cost());

        Ok(SearchPage {
            items: parse_search_items(&payload),
            next_page_token: parse_next_page_token(&payload),
        })
    }

    async fn most_popular(
        &self,
        region_code: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, ProviderError> {
        let mut params: Vec<(&str, String)> = vec![
            ("part", "snippet,statistics".to_string()),
            ("chart", "mostPopular".to_string()),
            ("regionCode", region_code.to_string()),
            ("maxResults", MAX_RESULTS_PER_PAGE.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let payload = with_retry(|| self.get_json("videos", &params)).await?;
        self.throttle().await;
        self.quota.record("videos.list(mostPopular)", 1);

        let items = payload
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| {
                let video_id = item.get("id")?.as_str()?.to_string();
                let snippet = item.get("snippet")?;
                let channel_id = snippet.get("channelId")?.as_str()?.to_string();
                let title = snippet.get("title")?.as_str().unwrap_or_default().to_string();
                let published_at = snippet.get("publishedAt")?.as_str().unwrap_or_default().to_string();
                Some(SearchItem { video_id, channel_id, title, published_at })
            })
            .collect();

        Ok(SearchPage { items, next_page_token: parse_next_page_token(&payload) })
    }
}

#[async_trait]
impl DetailProvider for YoutubeDataApiProvider {
    async fn list_channels(&self, ids: &[String]) -> Result<Vec<ChannelResult>, ProviderError> {
        let mut out = Vec::with_capacity(ids.len());
        for batch in chunks(ids, MAX_RESULTS_PER_PAGE as usize) {
            let params = vec![
                ("part", "snippet,statistics,topicDetails,status,brandingSettings,contentDetails".to_string()),
                ("id", batch.join(",")),
            ];
            let payload = with_retry(|| self.get_json("channels", &params)).await?;
            self.throttle().await;
            self.quota.record("channels.list", 1);

            let found: Vec<ChannelResource> = payload
                .get("items")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(parse_channel_resource)
                .collect();
            let found_ids: std::collections::HashSet<&str> =
                found.iter().map(|c| c.channel_id.as_str()).collect();

            for id in &batch {
                if !found_ids.contains(id.as_str()) {
                    out.push(ChannelResult::NotFound { id: id.clone() });
                }
            }
            out.extend(found.into_iter().map(ChannelResult::Found));
        }
        Ok(out)
    }

    async fn list_videos(&self, ids: &[String]) -> Result<Vec<VideoResult>, ProviderError> {
        let mut out = Vec::with_capacity(ids.len());
        for batch in chunks(ids, MAX_RESULTS_PER_PAGE as usize) {
            let params = vec![
                ("part", "statistics,contentDetails,snippet".to_string()),
                ("id", batch.join(",")),
            ];
            let payload = with_retry(|| self.get_json("videos", &params)).await?;
            self.throttle().await;
            self.quota.record("videos.list", 1);

            let found: Vec<VideoResource> = payload
                .get("items")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(parse_video_resource)
                .collect();
            let found_ids: std::collections::HashSet<&str> =
                found.iter().map(|v| v.video_id.as_str()).collect();

            for id in &batch {
                if !found_ids.contains(id.as_str()) {
                    out.push(VideoResult::NotFound { id: id.clone() });
                }
            }
            out.extend(found.into_iter().map(VideoResult::Found));
        }
        Ok(out)
    }

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistPage, ProviderError> {
        let mut params: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", MAX_RESULTS_PER_PAGE.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let payload = with_retry(|| self.get_json("playlistItems", &params)).await?;
        self.throttle().await;
        self.quota.record("playlistItems.list", 1);

        Ok(PlaylistPage {
            items: parse_playlist_items(&payload),
            next_page_token: parse_next_page_token(&payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_search_items_from_payload() {
        let payload = json!({
            "items": [{
                "id": {"videoId": "v1"},
                "snippet": {"channelId": "c1", "title": "t1", "publishedAt": "2026-01-01T00:00:00Z"}
            }],
            "nextPageToken": "abc"
        });
        let items = parse_search_items(&payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].video_id, "v1");
        assert_eq!(parse_next_page_token(&payload), Some("abc".to_string()));
    }

    #[test]
    fn parses_channel_resource_with_missing_optional_fields() {
        let payload = json!({"id": "c1", "snippet": {"title": "Channel"}});
        let resource = parse_channel_resource(&payload).unwrap();
        assert_eq!(resource.channel_id, "c1");
        assert_eq!(resource.title, "Channel");
        assert!(resource.subscriber_count.is_none());
    }
}
