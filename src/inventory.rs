//! Full-history video enumeration: pages each channel's uploads playlist to
//! completion and appends one row per video encountered. Checkpointed per
//! channel so a resumed run skips channels already finished.

use crate::checkpoint::CheckpointStore;
use crate::csv_writer::AppendOnlyCsvWriter;
use crate::errors::PipelineError;
use crate::model::{iso8601, VideoSighting};
use crate::provider::DetailProvider;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Derives the uploads-playlist handle from a channel ID by swapping the
/// `UC` prefix for `UU`. Channels whose ID does not start with `UC` have no
/// derivable uploads playlist and are skipped.
pub fn uploads_playlist_id(channel_id: &str) -> Option<String> {
    channel_id.strip_prefix("UC").map(|rest| format!("UU{rest}"))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct InventoryCheckpoint {
    pub completed_channels: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InventorySummary {
    pub channels_processed: usize,
    pub videos_written: usize,
    pub channels_skipped_no_playlist: usize,
}

pub struct InventoryEnumerator {
    details: Box<dyn DetailProvider>,
    checkpoint: CheckpointStore<InventoryCheckpoint>,
    writer: AppendOnlyCsvWriter<VideoSighting>,
}

impl InventoryEnumerator {
    pub fn new(details: Box<dyn DetailProvider>, checkpoint_path: PathBuf, output_path: PathBuf) -> Self {
        InventoryEnumerator {
            details,
            checkpoint: CheckpointStore::new(checkpoint_path),
            writer: AppendOnlyCsvWriter::new(output_path),
        }
    }

    pub async fn run(&self, channel_ids: &[String]) -> Result<InventorySummary, PipelineError> {
        let mut checkpoint = self.checkpoint.load().unwrap_or_default();
        let mut summary = InventorySummary::default();

        for channel_id in channel_ids {
            if checkpoint.completed_channels.contains(channel_id) {
                continue;
            }

            let Some(playlist_id) = uploads_playlist_id(channel_id) else {
                warn!(channel_id, "channel id has no derivable uploads playlist, skipping");
                summary.channels_skipped_no_playlist += 1;
                checkpoint.completed_channels.insert(channel_id.clone());
                self.checkpoint.save(&checkpoint)?;
                continue;
            };

            let mut page_token: Option<String> = None;
            loop {
                let page = match self.details.list_playlist_items(&playlist_id, page_token.as_deref()).await {
                    Ok(page) => page,
                    Err(err) if is_not_found(&err) => {
                        info!(channel_id, "uploads playlist not found, treating channel as complete");
                        break;
                    }
                    Err(err) => return Err(err.into()),
                };

                for item in &page.items {
                    let sighting = VideoSighting {
                        video_id: item.video_id.clone(),
                        channel_id: channel_id.clone(),
                        published_at: Some(item.published_at.clone()),
                        title: Some(item.title.clone()),
                        scraped_at: iso8601(Utc::now()),
                    };
                    self.writer.append(&sighting)?;
                    summary.videos_written += 1;
                }

                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }

            checkpoint.completed_channels.insert(channel_id.clone());
            self.checkpoint.save(&checkpoint)?;
            summary.channels_processed += 1;
        }

        self.checkpoint.clear()?;
        Ok(summary)
    }
}

fn is_not_found(err: &crate::errors::ProviderError) -> bool {
    matches!(err, crate::errors::ProviderError::Terminal { status: 404, .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_id_swaps_uc_prefix_for_uu() {
        assert_eq!(uploads_playlist_id("UCabc123"), Some("UUabc123".to_string()));
    }

    #[test]
    fn playlist_id_is_none_for_non_uc_prefixed_ids() {
        assert_eq!(uploads_playlist_id("XYZ123"), None);
    }

    #[tokio::test]
    async fn empty_channel_list_completes_with_zero_videos() {
        use crate::provider::mock::MockDetailProvider;
        let dir = tempfile::tempdir().unwrap();
        let enumerator = InventoryEnumerator::new(
            Box::new(MockDetailProvider::default()),
            dir.path().join("checkpoint.json"),
            dir.path().join("inventory.csv"),
        );
        let summary = enumerator.run(&[]).await.unwrap();
        assert_eq!(summary.videos_written, 0);
    }

    #[tokio::test]
    async fn channel_without_derivable_playlist_is_skipped_and_logged() {
        use crate::provider::mock::MockDetailProvider;
        let dir = tempfile::tempdir().unwrap();
        let enumerator = InventoryEnumerator::new(
            Box::new(MockDetailProvider::default()),
            dir.path().join("checkpoint.json"),
            dir.path().join("inventory.csv"),
        );
        let summary = enumerator.run(&["not-a-channel-id".to_string()]).await.unwrap();
        assert_eq!(summary.channels_skipped_no_playlist, 1);
    }
}
