//! In-memory mock providers for unit-testing collectors without network
//! access: callers script fixed responses (or a canned error) per call.

use super::{
    ChannelResult, DetailProvider, PlaylistPage, SearchPage, SearchProvider, SearchRequest,
    VideoResult,
};
use crate::errors::ProviderError;
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockSearchProvider {
    pub search_responses: Mutex<Vec<Result<SearchPage, ProviderError>>>,
    pub most_popular_responses: Mutex<Vec<Result<SearchPage, ProviderError>>>,
    pub search_calls: Mutex<Vec<SearchRequest>>,
}

impl MockSearchProvider {
    pub fn with_search_responses(responses: Vec<Result<SearchPage, ProviderError>>) -> Self {
        MockSearchProvider {
            search_responses: Mutex::new(responses),
            most_popular_responses: Mutex::new(Vec::new()),
            search_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search_videos(&self, req: SearchRequest) -> Result<SearchPage, ProviderError> {
        self.search_calls.lock().unwrap().push(req);
        self.search_responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(SearchPage::default()))
    }

    async fn most_popular(
        &self,
        _region_code: &str,
        _page_token: Option<&str>,
    ) -> Result<SearchPage, ProviderError> {
        self.most_popular_responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(SearchPage::default()))
    }
}

#[derive(Default)]
pub struct MockDetailProvider {
    pub channel_responses: Mutex<Vec<Result<Vec<ChannelResult>, ProviderError>>>,
    pub video_responses: Mutex<Vec<Result<Vec<VideoResult>, ProviderError>>>,
    pub playlist_responses: Mutex<Vec<Result<PlaylistPage, ProviderError>>>,
}

impl MockDetailProvider {
    pub fn with_channel_responses(responses: Vec<Result<Vec<ChannelResult>, ProviderError>>) -> Self {
        MockDetailProvider {
            channel_responses: Mutex::new(responses),
            video_responses: Mutex::new(Vec::new()),
            playlist_responses: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DetailProvider for MockDetailProvider {
    async fn list_channels(&self, _ids: &[String]) -> Result<Vec<ChannelResult>, ProviderError> {
        self.channel_responses.lock().unwrap().pop().unwrap_or(Ok(Vec::new()))
    }

    async fn list_videos(&self, _ids: &[String]) -> Result<Vec<VideoResult>, ProviderError> {
        self.video_responses.lock().unwrap().pop().unwrap_or(Ok(Vec::new()))
    }

    async fn list_playlist_items(
        &self,
        _playlist_id: &str,
        _page_token: Option<&str>,
    ) -> Result<PlaylistPage, ProviderError> {
        self.playlist_responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(PlaylistPage::default()))
    }
}
