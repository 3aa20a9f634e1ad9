//! Daily trending-chart enumeration across the region-code list: one
//! sighting row per chart item, plus a deduplicated cumulative
//! `channel_details.csv` built from channel IDs not already present there.

use crate::checkpoint::{rehydrate_seen_ids_from_csv, CheckpointStore, DateScopedCheckpoint};
use crate::csv_writer::AppendOnlyCsvWriter;
use crate::errors::PipelineError;
use crate::model::{iso8601, ChannelSnapshot, FirstVideo, Provenance, TrendingSighting};
use crate::provider::{ChannelResult, DetailProvider, SearchProvider};
use crate::taxonomy::TRENDING_REGION_CODES;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::warn;

const MAX_PAGES_PER_REGION: u32 = 4;

#[derive(Debug, Clone, Default)]
pub struct TrendingSummary {
    pub sightings: usize,
    pub new_channels: usize,
    pub regions_processed: usize,
}

pub struct TrendingCollector {
    search: Box<dyn SearchProvider>,
    details: Box<dyn DetailProvider>,
    checkpoint: CheckpointStore<DateScopedCheckpoint<BTreeSet<String>>>,
    sightings_writer: AppendOnlyCsvWriter<TrendingSighting>,
    channel_details_writer: AppendOnlyCsvWriter<ChannelSnapshot>,
}

impl TrendingCollector {
    pub fn new(
        search: Box<dyn SearchProvider>,
        details: Box<dyn DetailProvider>,
        checkpoint_path: PathBuf,
        sightings_path: PathBuf,
        channel_details_path: PathBuf,
    ) -> Self {
        TrendingCollector {
            search,
            details,
            checkpoint: CheckpointStore::new(checkpoint_path),
            sightings_writer: AppendOnlyCsvWriter::new(sightings_path),
            channel_details_writer: AppendOnlyCsvWriter::new(channel_details_path),
        }
    }

    pub async fn run(&self, trending_date: NaiveDate) -> Result<TrendingSummary, PipelineError> {
        let today = Utc::now().date_naive();
        let mut completed_regions = self
            .checkpoint
            .load()
            .and_then(|checkpoint| checkpoint.if_current(today))
            .unwrap_or_default();

        let mut known_channels: HashSet<String> =
            rehydrate_seen_ids_from_csv(self.channel_details_writer.path(), "channel_id")?
                .into_iter()
                .collect();

        let mut summary = TrendingSummary::default();

        for &region_code in TRENDING_REGION_CODES {
            if completed_regions.contains(region_code) {
                continue;
            }

            let mut position = 0u32;
            let mut page_token: Option<String> = None;
            let mut channel_ids_this_region: Vec<String> = Vec::new();

            for _ in 0..MAX_PAGES_PER_REGION {
                let page = match self.search.most_popular(region_code, page_token.as_deref()).await {
                    Ok(page) => page,
                    Err(err) => {
                        warn!(region = region_code, error = %err, "trending fetch failed for region, skipping");
                        break;
                    }
                };

                for item in &page.items {
                    position += 1;
                    let sighting = TrendingSighting {
                        trending_date: trending_date.format("%Y-%m-%d").to_string(),
                        region_code: region_code.to_string(),
                        position,
                        video_id: item.video_id.clone(),
                        channel_id: item.channel_id.clone(),
                        title: item.title.clone(),
                        view_count: None,
                        like_count: None,
                        comment_count: None,
                        category_id: None,
                        scraped_at: iso8601(Utc::now()),
                    };
                    self.sightings_writer.append(&sighting)?;
                    summary.sightings += 1;

                    if !known_channels.contains(&item.channel_id) {
                        channel_ids_this_region.push(item.channel_id.clone());
                    }
                }

                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }

            channel_ids_this_region.dedup();
            if !channel_ids_this_region.is_empty() {
                let results = self.details.list_channels(&channel_ids_this_region).await?;
                for result in results {
                    if let ChannelResult::Found(resource) = result {
                        if known_channels.insert(resource.channel_id.clone()) {
                            let mut snapshot = ChannelSnapshot {
                                channel_id: resource.channel_id,
                                title: resource.title,
                                description: resource.description,
                                custom_url: resource.custom_url,
                                published_at: resource.published_at,
                                view_count: resource.view_count,
                                subscriber_count: resource.subscriber_count,
                                video_count: resource.video_count,
                                country: resource.country,
                                default_language: resource.default_language,
                                topic_names: crate::taxonomy::decode_topic_names(&resource.topic_ids),
                                topic_ids: resource.topic_ids,
                                made_for_kids: resource.made_for_kids,
                                privacy_status: resource.privacy_status,
                                longuploads_status: resource.longuploads_status,
                                branding_keywords: resource.branding_keywords,
                                localizations: resource.localizations,
                                uploads_playlist_id: resource.uploads_playlist_id,
                                status: None,
                                first_video: FirstVideo::default(),
                                provenance: Provenance {
                                    stream_type: "trending".to_string(),
                                    discovery_keyword: String::new(),
                                    discovery_language: String::new(),
                                    discovery_method: "trending".to_string(),
                                    discovery_order: "chart".to_string(),
                                    discovery_safesearch: "moderate".to_string(),
                                    discovery_duration: "any".to_string(),
                                    discovery_topic_id: None,
                                    discovery_topic_name: None,
                                    discovery_region_code: Some(region_code.to_string()),
                                    discovery_window_hours: None,
                                    expansion_wave: None,
                                },
                            };
                            snapshot.truncate_description();
                            self.channel_details_writer.append(&snapshot)?;
                            summary.new_channels += 1;
                        }
                    }
                }
            }

            completed_regions.insert(region_code.to_string());
            summary.regions_processed += 1;
            self.checkpoint
                .save(&DateScopedCheckpoint::for_today(completed_regions.clone(), today))?;
        }

        self.checkpoint.clear()?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{MockDetailProvider, MockSearchProvider};
    use crate::provider::SearchItem;
    use crate::provider::SearchPage;

    #[tokio::test]
    async fn run_writes_one_sighting_per_chart_item() {
        let dir = tempfile::tempdir().unwrap();
        let mut responses: Vec<_> = (0..TRENDING_REGION_CODES.len())
            .map(|_| Ok(SearchPage { items: vec![], next_page_token: None }))
            .collect();
        responses[TRENDING_REGION_CODES.len() - 1] = Ok(SearchPage {
            items: vec![SearchItem {
                video_id: "v1".into(),
                channel_id: "UC1".into(),
                title: "Trending Video".into(),
                published_at: "2026-01-01T00:00:00Z".into(),
            }],
            next_page_token: None,
        });

        let collector = TrendingCollector::new(
            Box::new(MockSearchProvider::with_search_responses(responses)),
            Box::new(MockDetailProvider::default()),
            dir.path().join("checkpoint.json"),
            dir.path().join("sightings.csv"),
            dir.path().join("channel_details.csv"),
        );

        let summary = collector.run(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()).await.unwrap();
        assert_eq!(summary.sightings, 1);
        assert_eq!(summary.regions_processed, TRENDING_REGION_CODES.len());
    }
}
