//! Orchestrates keywords × passes × time-windows into channel discoveries:
//! dedupes against an accumulated seen-set and an optional cross-stream
//! exclude-set, applies the cohort-cutoff filter, stamps provenance, and
//! checkpoints after every completed pass.

mod windows;

pub use windows::{generate_windows, halve_windows};

use crate::checkpoint::{rehydrate_seen_ids_from_csv, CheckpointStore, DiscoveryCheckpoint};
use crate::csv_writer::AppendOnlyCsvWriter;
use crate::errors::PipelineError;
use crate::extras::{EventType, SafeSearch, Strategy};
use crate::model::{ChannelSnapshot, FirstVideo};
use crate::pass_generator::{generate_passes, relevance_pass, windows_12h_pass, CapObservation, Pass};
use crate::provider::{ChannelResult, DetailProvider, SearchProvider, SearchRequest};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::{info, warn};

/// The 12h-windows conditional pass fires once more than half the base
/// pass's windows hit the upstream result cap.
const WINDOWS_12H_TRIGGER_FRACTION: f64 = 0.5;

pub struct DiscoveryInput {
    pub stream_name: String,
    pub keywords: Vec<(String, String)>,
    pub strategies: BTreeSet<Strategy>,
    pub exclude_ids: Option<PathBuf>,
    pub days_back: i64,
    pub window_hours: i64,
    pub target_channel_count: usize,
    pub cohort_filter: Option<NaiveDate>,
    pub relevance_cap_threshold: f64,
    pub event_type: Option<EventType>,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoverySummary {
    pub channels_discovered: usize,
    pub passes_completed: usize,
    pub stopped_early: bool,
}

pub struct DiscoveryDriver {
    search: Box<dyn SearchProvider>,
    details: Box<dyn DetailProvider>,
    checkpoint: CheckpointStore<DiscoveryCheckpoint>,
    writer: AppendOnlyCsvWriter<ChannelSnapshot>,
}

impl DiscoveryDriver {
    pub fn new(
        search: Box<dyn SearchProvider>,
        details: Box<dyn DetailProvider>,
        checkpoint_path: PathBuf,
        output_path: PathBuf,
    ) -> Self {
        DiscoveryDriver {
            search,
            details,
            checkpoint: CheckpointStore::new(checkpoint_path),
            writer: AppendOnlyCsvWriter::new(output_path),
        }
    }

    pub async fn run(&self, input: DiscoveryInput) -> Result<DiscoverySummary, PipelineError> {
        let mut checkpoint = self.checkpoint.load().unwrap_or_else(|| DiscoveryCheckpoint {
            output_path: self.writer.path().to_path_buf(),
            ..Default::default()
        });

        let mut seen: HashSet<String> = rehydrate_seen_ids_from_csv(self.writer.path(), "channel_id")?
            .into_iter()
            .collect();
        let exclude: HashSet<String> = match &input.exclude_ids {
            Some(path) => rehydrate_seen_ids_from_csv(path, "channel_id")?.into_iter().collect(),
            None => HashSet::new(),
        };

        let mut summary = DiscoverySummary::default();
        let now = Utc::now();
        let window_start = now - chrono::Duration::days(input.days_back.max(0));

        'keywords: for (keyword, language) in &input.keywords {
            let base_windows = generate_windows(window_start, now, input.window_hours);
            let safe_search = if input.strategies.contains(&Strategy::SafeSearch) {
                SafeSearch::None
            } else {
                SafeSearch::Moderate
            };

            let static_passes = generate_passes(keyword, language, &input.strategies, input.event_type);
            let mut cap_observation = CapObservation::default();

            for pass in &static_passes {
                let is_base = pass.name == "base";
                let work_unit = format!("{keyword}|{language}|{}", pass.name);
                if checkpoint.completed_work_units.contains(&work_unit) {
                    continue;
                }

                let discovered = self
                    .run_pass(
                        keyword,
                        pass,
                        &base_windows,
                        &input,
                        &mut seen,
                        &exclude,
                        if is_base { Some(&mut cap_observation) } else { None },
                    )
                    .await?;

                summary.channels_discovered += discovered;
                checkpoint.completed_work_units.insert(work_unit);
                checkpoint.channel_count = seen.len();
                checkpoint.timestamp = Some(Utc::now());
                self.checkpoint.save(&checkpoint)?;
                summary.passes_completed += 1;

                if seen.len() >= input.target_channel_count {
                    summary.stopped_early = true;
                    break 'keywords;
                }
            }

            if input.strategies.contains(&Strategy::Relevance) && cap_observation.any_capped() {
                let capped_windows: Vec<_> = cap_observation.windows_capped.iter().copied().collect();
                let work_unit = format!("{keyword}|{language}|relevance");
                if !checkpoint.completed_work_units.contains(&work_unit) {
                    let pass = relevance_pass(keyword, language, safe_search);
                    let discovered = self
                        .run_pass(keyword, &pass, &capped_windows, &input, &mut seen, &exclude, None)
                        .await?;
                    summary.channels_discovered += discovered;
                    checkpoint.completed_work_units.insert(work_unit);
                    checkpoint.channel_count = seen.len();
                    self.checkpoint.save(&checkpoint)?;
                    summary.passes_completed += 1;
                }
            }

            if input.strategies.contains(&Strategy::Windows)
                && cap_observation.capped_fraction() > WINDOWS_12H_TRIGGER_FRACTION
            {
                let work_unit = format!("{keyword}|{language}|windows_12h");
                if !checkpoint.completed_work_units.contains(&work_unit) {
                    let halved = halve_windows(&base_windows);
                    let pass = windows_12h_pass(keyword, language, safe_search);
                    let discovered =
                        self.run_pass(keyword, &pass, &halved, &input, &mut seen, &exclude, None).await?;
                    summary.channels_discovered += discovered;
                    checkpoint.completed_work_units.insert(work_unit);
                    checkpoint.channel_count = seen.len();
                    self.checkpoint.save(&checkpoint)?;
                    summary.passes_completed += 1;
                }
            }

            if seen.len() >= input.target_channel_count {
                summary.stopped_early = true;
                break 'keywords;
            }
        }

        if summary.stopped_early || checkpoint.completed_work_units.len() >= count_total_work_units(&input) {
            self.checkpoint.clear()?;
        }

        Ok(summary)
    }

    async fn run_pass(
        &self,
        keyword: &str,
        pass: &Pass,
        windows: &[(DateTime<Utc>, DateTime<Utc>)],
        input: &DiscoveryInput,
        seen: &mut HashSet<String>,
        exclude: &HashSet<String>,
        mut cap_observation: Option<&mut CapObservation>,
    ) -> Result<usize, PipelineError> {
        let mut candidate_ids: Vec<String> = Vec::new();
        let mut candidate_seen = HashSet::new();

        for &(window_start, window_end) in windows {
            let mut page_token: Option<String> = None;
            let mut page_count = 0u32;
            let mut window_item_count = 0usize;

            loop {
                let request = SearchRequest {
                    query: keyword.to_string(),
                    published_after: window_start,
                    published_before: window_end,
                    order: pass.order,
                    page_token: page_token.clone(),
                    extras: pass.extras.clone(),
                };

                let page = match self.search.search_videos(request).await {
                    Ok(page) => page,
                    Err(err) => {
                        warn!(pass = %pass.name, error = %err, "search pass batch failed, skipping batch");
                        break;
                    }
                };

                window_item_count += page.items.len();
                for item in &page.items {
                    if !seen.contains(&item.channel_id)
                        && !exclude.contains(&item.channel_id)
                        && candidate_seen.insert(item.channel_id.clone())
                    {
                        candidate_ids.push(item.channel_id.clone());
                    }
                }

                page_count += 1;
                match page.next_page_token {
                    Some(token) if page_count < pass.max_pages => page_token = Some(token),
                    _ => break,
                }
            }

            if let Some(obs) = cap_observation.as_deref_mut() {
                obs.observe((window_start, window_end), window_item_count, pass.max_pages);
            }
        }

        if candidate_ids.is_empty() {
            return Ok(0);
        }

        let results = self.details.list_channels(&candidate_ids).await?;
        let mut discovered = 0usize;

        for result in results {
            let resource = match result {
                ChannelResult::Found(resource) => resource,
                ChannelResult::NotFound { id } => {
                    warn!(channel_id = %id, "channel vanished between search and detail lookup, skipping");
                    continue;
                }
            };

            if let Some(cutoff) = input.cohort_filter {
                let published = resource
                    .published_at
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc).date_naive());
                if published.map(|d| d < cutoff).unwrap_or(true) {
                    continue;
                }
            }

            let mut provenance = pass.provenance.clone();
            provenance.stream_type = input.stream_name.clone();

            let mut snapshot = ChannelSnapshot {
                channel_id: resource.channel_id.clone(),
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
                provenance,
            };
            snapshot.truncate_description();

            self.writer.append(&snapshot)?;
            seen.insert(snapshot.channel_id.clone());
            discovered += 1;
        }

        Ok(discovered)
    }

    /// Post-hoc enrichment: for each channel with a non-empty uploads
    /// playlist, pages it up to 10 pages and records the oldest entry seen
    /// within that cap as the channel's first video. This preserves the
    /// documented limitation that channels with thousands of uploads may
    /// not yield their true oldest video, rather than silently paginating
    /// to completion.
    pub async fn enrich_first_videos(&self) -> Result<usize, PipelineError> {
        const MAX_PAGES: u32 = 10;

        let mut rows: Vec<ChannelSnapshot> = self.writer.read_all()?;
        let mut enriched = 0usize;

        for row in rows.iter_mut() {
            let Some(playlist_id) = row.uploads_playlist_id.clone() else {
                continue;
            };

            let mut oldest: Option<(String, String, String)> = None;
            let mut page_token: Option<String> = None;
            for _ in 0..MAX_PAGES {
                let page = match self.details.list_playlist_items(&playlist_id, page_token.as_deref()).await {
                    Ok(page) => page,
                    Err(err) => {
                        warn!(channel_id = %row.channel_id, error = %err, "first-video enrichment failed, skipping channel");
                        break;
                    }
                };
                for item in &page.items {
                    let is_older = oldest
                        .as_ref()
                        .map(|(_, _, date)| item.published_at < *date)
                        .unwrap_or(true);
                    if is_older {
                        oldest = Some((item.video_id.clone(), item.title.clone(), item.published_at.clone()));
                    }
                }
                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }

            if let Some((id, title, date)) = oldest {
                row.first_video = FirstVideo {
                    first_video_id: Some(id),
                    first_video_title: Some(title),
                    first_video_date: Some(date),
                };
                enriched += 1;
            }
        }

        self.writer.rewrite(&rows)?;
        info!(enriched, "first-video enrichment complete");
        Ok(enriched)
    }
}

fn count_total_work_units(input: &DiscoveryInput) -> usize {
    input
        .keywords
        .iter()
        .map(|(keyword, language)| {
            generate_passes(keyword, language, &input.strategies, input.event_type).len()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extras::Strategy;
    use crate::provider::mock::{MockDetailProvider, MockSearchProvider};
    use crate::provider::{ChannelResource, SearchItem, SearchPage};

    fn channel(id: &str) -> ChannelResource {
        ChannelResource {
            channel_id: id.to_string(),
            title: "Some Channel".to_string(),
            description: "desc".to_string(),
            custom_url: None,
            published_at: Some("2026-01-01T00:00:00Z".to_string()),
            view_count: Some(100),
            subscriber_count: Some(10),
            video_count: Some(5),
            country: None,
            default_language: None,
            topic_ids: Vec::new(),
            made_for_kids: Some(false),
            privacy_status: Some("public".to_string()),
            longuploads_status: None,
            branding_keywords: Vec::new(),
            localizations: Vec::new(),
            uploads_playlist_id: None,
        }
    }

    #[tokio::test]
    async fn empty_keyword_list_completes_with_zero_rows() {
        let dir = tempfile::tempdir().unwrap();
        let driver = DiscoveryDriver::new(
            Box::new(MockSearchProvider::default()),
            Box::new(MockDetailProvider::default()),
            dir.path().join("checkpoint.json"),
            dir.path().join("output.csv"),
        );

        let summary = driver
            .run(DiscoveryInput {
                stream_name: "test_stream".to_string(),
                keywords: Vec::new(),
                strategies: [Strategy::Base].into_iter().collect(),
                exclude_ids: None,
                days_back: 2,
                window_hours: 24,
                target_channel_count: 1000,
                cohort_filter: None,
                relevance_cap_threshold: 0.5,
                event_type: None,
            })
            .await
            .unwrap();

        assert_eq!(summary.channels_discovered, 0);
        assert_eq!(summary.passes_completed, 0);
    }

    #[tokio::test]
    async fn base_pass_discovers_and_dedupes_channels() {
        let dir = tempfile::tempdir().unwrap();
        let search = MockSearchProvider::with_search_responses(vec![Ok(SearchPage {
            items: vec![
                SearchItem { video_id: "v1".into(), channel_id: "UC1".into(), title: "t".into(), published_at: "2026-01-01T00:00:00Z".into() },
                SearchItem { video_id: "v2".into(), channel_id: "UC1".into(), title: "t2".into(), published_at: "2026-01-01T00:00:00Z".into() },
            ],
            next_page_token: None,
        })]);
        let details = MockDetailProvider::with_channel_responses(vec![Ok(vec![ChannelResult::Found(channel("UC1"))])]);

        let driver = DiscoveryDriver::new(
            Box::new(search),
            Box::new(details),
            dir.path().join("checkpoint.json"),
            dir.path().join("output.csv"),
        );

        let summary = driver
            .run(DiscoveryInput {
                stream_name: "test_stream".to_string(),
                keywords: vec![("my first video".to_string(), "english".to_string())],
                strategies: [Strategy::Base].into_iter().collect(),
                exclude_ids: None,
                days_back: 0,
                window_hours: 24,
                target_channel_count: 1000,
                cohort_filter: None,
                relevance_cap_threshold: 0.5,
                event_type: None,
            })
            .await
            .unwrap();

        assert_eq!(summary.channels_discovered, 1);
    }
}
