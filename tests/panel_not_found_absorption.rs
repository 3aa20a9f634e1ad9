//! A batch channel lookup where some ids have been deleted upstream must not
//! fail the run: every id gets a row, the deleted ones carry
//! `status = "not_found"` and null counts, and the rest get their real stats.

use chrono::NaiveDate;
use std::collections::HashSet;
use youtube_panel::csv_writer::AppendOnlyCsvWriter;
use youtube_panel::model::ChannelStatsSnapshot;
use youtube_panel::panel::{Mode, PanelCollector, PanelInput};
use youtube_panel::provider::mock::MockDetailProvider;
use youtube_panel::provider::{ChannelResource, ChannelResult};

fn found(id: &str) -> ChannelResult {
    ChannelResult::Found(ChannelResource {
        channel_id: id.to_string(),
        title: "t".to_string(),
        description: "d".to_string(),
        custom_url: None,
        published_at: None,
        view_count: Some(1_000),
        subscriber_count: Some(100),
        video_count: Some(10),
        country: None,
        default_language: None,
        topic_ids: Vec::new(),
        made_for_kids: None,
        privacy_status: None,
        longuploads_status: None,
        branding_keywords: Vec::new(),
        localizations: Vec::new(),
        uploads_playlist_id: None,
    })
}

#[tokio::test]
async fn deleted_channels_in_a_batch_get_absorbed_not_found_rows() {
    let dir = tempfile::tempdir().unwrap();
    let channel_ids: Vec<String> = (1..=50).map(|i| format!("UC{i}")).collect();

    let mut results: Vec<ChannelResult> = channel_ids[..47].iter().map(|id| found(id)).collect();
    results.extend(channel_ids[47..].iter().map(|id| ChannelResult::NotFound { id: id.clone() }));

    let channel_stats_path = dir.path().join("channel_stats.csv");
    let details = MockDetailProvider::with_channel_responses(vec![Ok(results)]);
    let collector = PanelCollector::new(
        Box::new(details),
        dir.path().join("checkpoint.json"),
        channel_stats_path.clone(),
        dir.path().join("video_stats.csv"),
        dir.path().join("inventory.csv"),
    );

    let summary = collector
        .run(PanelInput {
            mode: Mode::Channel,
            channel_ids: channel_ids.clone(),
            video_ids: Vec::new(),
            date: NaiveDate::from_ymd_opt(2026, 2, 22).unwrap(),
            is_backfill: true,
            yesterday_channel_video_counts: None,
            known_inventory_video_ids: HashSet::new(),
        })
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(summary.channel_rows_written, 50);

    let rows: Vec<ChannelStatsSnapshot> = AppendOnlyCsvWriter::new(channel_stats_path).read_all().unwrap();
    assert_eq!(rows.len(), 50);

    let not_found: Vec<_> = rows.iter().filter(|r| r.status.as_deref() == Some("not_found")).collect();
    assert_eq!(not_found.len(), 3);
    for row in &not_found {
        assert!(channel_ids[47..].contains(&row.channel_id));
        assert!(row.view_count.is_none());
        assert!(row.subscriber_count.is_none());
        assert!(row.video_count.is_none());
    }

    let present: Vec<_> = rows.iter().filter(|r| r.status.is_none()).collect();
    assert_eq!(present.len(), 47);
    assert!(present.iter().all(|r| r.view_count == Some(1_000)));
}
