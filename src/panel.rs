//! Dual-cadence panel collection: daily channel-stats snapshots and weekly
//! video-stats snapshots over the same entity set, plus new-video detection
//! via channel video-count diff.

use crate::checkpoint::{CheckpointStore, DateScopedCheckpoint};
use crate::csv_writer::AppendOnlyCsvWriter;
use crate::errors::PipelineError;
use crate::inventory::uploads_playlist_id;
use crate::model::{iso8601, ChannelStatsSnapshot, VideoSighting, VideoStatsSnapshot};
use crate::provider::{chunks, ChannelResult, DetailProvider, VideoResult};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Channel,
    Video,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PanelCheckpoint {
    pub channel_stats_done: bool,
    pub video_batches_done: usize,
    pub new_video_detection_done: bool,
}

pub struct PanelInput {
    pub mode: Mode,
    pub channel_ids: Vec<String>,
    pub video_ids: Vec<String>,
    pub date: NaiveDate,
    pub is_backfill: bool,
    pub yesterday_channel_video_counts: Option<HashMap<String, i64>>,
    pub known_inventory_video_ids: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PanelSummary {
    pub success: bool,
    pub error: Option<String>,
    pub channel_rows_written: usize,
    pub video_rows_written: usize,
    pub new_videos_detected: usize,
}

pub struct PanelCollector {
    details: Box<dyn DetailProvider>,
    checkpoint: CheckpointStore<DateScopedCheckpoint<PanelCheckpoint>>,
    channel_writer: AppendOnlyCsvWriter<ChannelStatsSnapshot>,
    video_writer: AppendOnlyCsvWriter<VideoStatsSnapshot>,
    inventory_writer: AppendOnlyCsvWriter<VideoSighting>,
}

impl PanelCollector {
    pub fn new(
        details: Box<dyn DetailProvider>,
        checkpoint_path: PathBuf,
        channel_stats_path: PathBuf,
        video_stats_path: PathBuf,
        inventory_path: PathBuf,
    ) -> Self {
        PanelCollector {
            details,
            checkpoint: CheckpointStore::new(checkpoint_path),
            channel_writer: AppendOnlyCsvWriter::new(channel_stats_path),
            video_writer: AppendOnlyCsvWriter::new(video_stats_path),
            inventory_writer: AppendOnlyCsvWriter::new(inventory_path),
        }
    }

    pub async fn run(&self, input: PanelInput) -> Result<PanelSummary, PipelineError> {
        if matches!(input.mode, Mode::Video) && input.video_ids.is_empty() {
            return Ok(PanelSummary {
                success: false,
                error: Some("Empty inventory".to_string()),
                ..Default::default()
            });
        }

        let today = Utc::now().date_naive();
        let mut checkpoint = self
            .checkpoint
            .load()
            .and_then(|c| c.if_current(today))
            .unwrap_or_default();

        let mut summary = PanelSummary { success: true, ..Default::default() };
        let mut current_video_counts: HashMap<String, i64> = HashMap::new();

        if matches!(input.mode, Mode::Channel | Mode::Both) && !checkpoint.channel_stats_done {
            for batch in chunks(&input.channel_ids, 50) {
                let results = self.details.list_channels(&batch).await?;
                for result in results {
                    let row = match result {
                        ChannelResult::Found(resource) => {
                            if let Some(count) = resource.video_count {
                                current_video_counts.insert(resource.channel_id.clone(), count);
                            }
                            ChannelStatsSnapshot {
                                channel_id: resource.channel_id,
                                view_count: resource.view_count,
                                subscriber_count: resource.subscriber_count,
                                video_count: resource.video_count,
                                scraped_at: iso8601(Utc::now()),
                                status: None,
                            }
                        }
                        ChannelResult::NotFound { id } => ChannelStatsSnapshot {
                            channel_id: id,
                            view_count: None,
                            subscriber_count: None,
                            video_count: None,
                            scraped_at: iso8601(Utc::now()),
                            status: Some("not_found".to_string()),
                        },
                    };
                    self.channel_writer.append(&row)?;
                    summary.channel_rows_written += 1;
                }
            }
            checkpoint.channel_stats_done = true;
            self.checkpoint.save(&DateScopedCheckpoint::for_today(checkpoint.clone(), today))?;

            if !input.is_backfill && !checkpoint.new_video_detection_done {
                summary.new_videos_detected = self.detect_new_videos(&input, &current_video_counts).await?;
                checkpoint.new_video_detection_done = true;
                self.checkpoint.save(&DateScopedCheckpoint::for_today(checkpoint.clone(), today))?;
            }
        }

        if matches!(input.mode, Mode::Video | Mode::Both) {
            let batches: Vec<Vec<String>> = chunks(&input.video_ids, 50);
            for (index, batch) in batches.iter().enumerate() {
                if index < checkpoint.video_batches_done {
                    continue;
                }
                let results = self.details.list_videos(batch).await?;
                for result in results {
                    let row = match result {
                        VideoResult::Found(resource) => VideoStatsSnapshot {
                            video_id: resource.video_id,
                            view_count: resource.view_count,
                            like_count: resource.like_count,
                            comment_count: resource.comment_count,
                            scraped_at: iso8601(Utc::now()),
                            status: None,
                        },
                        VideoResult::NotFound { id } => VideoStatsSnapshot {
                            video_id: id,
                            view_count: None,
                            like_count: None,
                            comment_count: None,
                            scraped_at: iso8601(Utc::now()),
                            status: Some("not_found".to_string()),
                        },
                    };
                    self.video_writer.append(&row)?;
                    summary.video_rows_written += 1;
                }
                checkpoint.video_batches_done = index + 1;
                self.checkpoint.save(&DateScopedCheckpoint::for_today(checkpoint.clone(), today))?;
            }
        }

        self.checkpoint.clear()?;
        Ok(summary)
    }

    /// For each channel whose video count grew since yesterday, pages the
    /// uploads playlist for the top `(delta + 5)` items and appends unknown
    /// video ids to the inventory with null `published_at`/`title`.
    async fn detect_new_videos(
        &self,
        input: &PanelInput,
        current_counts: &HashMap<String, i64>,
    ) -> Result<usize, PipelineError> {
        let Some(yesterday_counts) = &input.yesterday_channel_video_counts else {
            return Ok(0);
        };

        let mut new_videos = 0usize;

        for (channel_id, &today_count) in current_counts {
            let Some(&yesterday_count) = yesterday_counts.get(channel_id) else {
                continue;
            };
            if today_count <= yesterday_count {
                continue;
            }
            let delta = (today_count - yesterday_count) as usize;
            let take = delta + 5;

            let Some(playlist_id) = uploads_playlist_id(channel_id) else {
                continue;
            };

            let mut items = Vec::new();
            let mut page_token: Option<String> = None;
            while items.len() < take {
                let page = match self.details.list_playlist_items(&playlist_id, page_token.as_deref()).await {
                    Ok(page) => page,
                    Err(err) => {
                        warn!(channel_id, error = %err, "new-video detection paging failed, skipping channel");
                        break;
                    }
                };
                items.extend(page.items);
                match page.next_page_token {
                    Some(token) if items.len() < take => page_token = Some(token),
                    _ => break,
                }
            }
            items.truncate(take);

            for item in items {
                if input.known_inventory_video_ids.contains(&item.video_id) {
                    continue;
                }
                let sighting = VideoSighting {
                    video_id: item.video_id,
                    channel_id: channel_id.clone(),
                    published_at: None,
                    title: None,
                    scraped_at: iso8601(Utc::now()),
                };
                self.inventory_writer.append(&sighting)?;
                new_videos += 1;
            }
        }

        Ok(new_videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockDetailProvider;

    #[tokio::test]
    async fn video_mode_with_empty_inventory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let collector = PanelCollector::new(
            Box::new(MockDetailProvider::default()),
            dir.path().join("checkpoint.json"),
            dir.path().join("channel_stats.csv"),
            dir.path().join("video_stats.csv"),
            dir.path().join("inventory.csv"),
        );

        let summary = collector
            .run(PanelInput {
                mode: Mode::Video,
                channel_ids: Vec::new(),
                video_ids: Vec::new(),
                date: NaiveDate::from_ymd_opt(2026, 2, 22).unwrap(),
                is_backfill: false,
                yesterday_channel_video_counts: None,
                known_inventory_video_ids: HashSet::new(),
            })
            .await
            .unwrap();

        assert!(!summary.success);
        assert_eq!(summary.error.as_deref(), Some("Empty inventory"));
    }

    #[tokio::test]
    async fn not_found_channels_receive_null_stats_row() {
        let dir = tempfile::tempdir().unwrap();
        let details = MockDetailProvider::with_channel_responses(vec![Ok(vec![
            ChannelResult::NotFound { id: "UC1".to_string() },
        ])]);
        let collector = PanelCollector::new(
            Box::new(details),
            dir.path().join("checkpoint.json"),
            dir.path().join("channel_stats.csv"),
            dir.path().join("video_stats.csv"),
            dir.path().join("inventory.csv"),
        );

        let summary = collector
            .run(PanelInput {
                mode: Mode::Channel,
                channel_ids: vec!["UC1".to_string()],
                video_ids: Vec::new(),
                date: NaiveDate::from_ymd_opt(2026, 2, 22).unwrap(),
                is_backfill: true,
                yesterday_channel_video_counts: None,
                known_inventory_video_ids: HashSet::new(),
            })
            .await
            .unwrap();

        assert_eq!(summary.channel_rows_written, 1);
        let rows = collector.channel_writer.read_all().unwrap();
        assert_eq!(rows[0].status.as_deref(), Some("not_found"));
    }
}
