//! Simulates killing the process right after a discovery pass writes its
//! rows and saves its checkpoint, then resuming: the already-completed work
//! unit must not trigger another search call, and the output file must be
//! left exactly as the killed run left it.

use chrono::Utc;
use std::collections::BTreeSet;
use youtube_panel::checkpoint::{CheckpointStore, DiscoveryCheckpoint};
use youtube_panel::csv_writer::AppendOnlyCsvWriter;
use youtube_panel::discovery::{DiscoveryDriver, DiscoveryInput};
use youtube_panel::extras::Strategy;
use youtube_panel::model::{ChannelSnapshot, FirstVideo};
use youtube_panel::provider::mock::{MockDetailProvider, MockSearchProvider};

fn snapshot(channel_id: &str) -> ChannelSnapshot {
    ChannelSnapshot {
        channel_id: channel_id.to_string(),
        title: "Some Channel".to_string(),
        description: "desc".to_string(),
        custom_url: None,
        published_at: Some("2026-01-01T00:00:00Z".to_string()),
        view_count: Some(100),
        subscriber_count: Some(10),
        video_count: Some(5),
        country: None,
        default_language: None,
        topic_names: Vec::new(),
        topic_ids: Vec::new(),
        made_for_kids: Some(false),
        privacy_status: Some("public".to_string()),
        longuploads_status: None,
        branding_keywords: Vec::new(),
        localizations: Vec::new(),
        uploads_playlist_id: None,
        status: None,
        first_video: FirstVideo::default(),
        provenance: Default::default(),
    }
}

#[tokio::test]
async fn resumed_run_skips_the_completed_pass_and_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint_path = dir.path().join("checkpoint.json");
    let output_path = dir.path().join("output.csv");

    // The killed run already wrote both rows from its single "base" pass.
    let writer: AppendOnlyCsvWriter<ChannelSnapshot> = AppendOnlyCsvWriter::new(output_path.clone());
    writer.append(&snapshot("UC1")).unwrap();
    writer.append(&snapshot("UC2")).unwrap();

    // ...and saved its checkpoint marking that pass done, an instant before
    // it would have been cleared -- the window a real kill lands in.
    let work_unit = "my first video|English|base".to_string();
    let checkpoint = DiscoveryCheckpoint {
        completed_work_units: [work_unit].into_iter().collect(),
        output_path: output_path.clone(),
        channel_count: 2,
        timestamp: Some(Utc::now()),
    };
    CheckpointStore::new(checkpoint_path.clone()).save(&checkpoint).unwrap();

    // A search provider with nothing queued: any call would return an empty
    // page rather than panicking, so we verify "no calls happened" via the
    // driver's own summary, not via a mock assertion.
    let driver = DiscoveryDriver::new(
        Box::new(MockSearchProvider::default()),
        Box::new(MockDetailProvider::default()),
        checkpoint_path.clone(),
        output_path.clone(),
    );

    let summary = driver
        .run(DiscoveryInput {
            stream_name: "test_stream".to_string(),
            keywords: vec![("my first video".to_string(), "English".to_string())],
            strategies: BTreeSet::from([Strategy::Base]),
            exclude_ids: None,
            days_back: 2,
            window_hours: 24,
            target_channel_count: 1_000,
            cohort_filter: None,
            relevance_cap_threshold: 0.5,
            event_type: None,
        })
        .await
        .unwrap();

    assert_eq!(summary.passes_completed, 0, "the already-completed pass must not run again");
    assert_eq!(summary.channels_discovered, 0, "no new channels should come from a skipped pass");

    let rows: Vec<ChannelSnapshot> = AppendOnlyCsvWriter::new(output_path).read_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].channel_id, "UC1");
    assert_eq!(rows[1].channel_id, "UC2");

    assert!(!checkpoint_path.is_file(), "checkpoint is cleared once every work unit is accounted for");
}
