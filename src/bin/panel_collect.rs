//! Dual-cadence panel collection: daily channel-stats snapshots and, on the
//! days `--mode video` or `--mode both` is requested, weekly video-stats
//! snapshots over the same entity set.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use youtube_panel::config::PipelineConfig;
use youtube_panel::panel::{Mode as PanelMode, PanelCollector, PanelInput};
use youtube_panel::provider::live::YoutubeDataApiProvider;
use youtube_panel::provider::QuotaLog;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Channel,
    Video,
    Both,
}

impl From<ModeArg> for PanelMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Channel => PanelMode::Channel,
            ModeArg::Video => PanelMode::Video,
            ModeArg::Both => PanelMode::Both,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Collect a day's channel and/or video stats snapshot")]
struct Args {
    #[arg(long, value_enum, default_value_t = ModeArg::Channel)]
    mode: ModeArg,

    /// CSV with a `channel_id` column.
    #[arg(long)]
    channels_file: PathBuf,

    /// CSV with a `video_id` column (required for `--mode video`/`both`).
    #[arg(long)]
    videos_file: Option<PathBuf>,

    /// CSV with a `video_id` column: the cohort's full video inventory, used
    /// to avoid re-flagging already-known videos as new.
    #[arg(long)]
    inventory_file: Option<PathBuf>,

    /// Name distinguishing this panel's output subdirectory, e.g. a cohort.
    #[arg(long)]
    panel_name: Option<String>,

    #[arg(long)]
    date: Option<NaiveDate>,

    /// Skip new-video detection, for historical backfill runs.
    #[arg(long)]
    backfill: bool,

    #[arg(long)]
    project_root: Option<PathBuf>,
}

fn read_id_column(path: &PathBuf, column: &str) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("reading {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let Some(idx) = headers.iter().position(|h| h == column) else {
        anyhow::bail!("{} has no `{column}` column", path.display());
    };
    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(id) = record.get(idx) {
            if !id.trim().is_empty() {
                ids.push(id.trim().to_string());
            }
        }
    }
    Ok(ids)
}

fn read_channel_video_counts(path: &PathBuf) -> HashMap<String, i64> {
    let Ok(mut reader) = csv::Reader::from_path(path) else { return HashMap::new() };
    let mut counts = HashMap::new();
    for record in reader.deserialize::<youtube_panel::model::ChannelStatsSnapshot>().flatten() {
        if let Some(count) = record.video_count {
            counts.insert(record.channel_id, count);
        }
    }
    counts
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = PipelineConfig::load().context("loading configuration")?;
    if let Some(root) = &args.project_root {
        config.project_root = root.clone();
    }
    config.ensure_directories().context("bootstrapping data directories")?;
    youtube_panel::logging::init("panel_collect", &config.logs_dir()).context("initializing logging")?;

    let today = chrono::Utc::now().date_naive();
    let date = args.date.unwrap_or(today);

    let channel_ids = read_id_column(&args.channels_file, "channel_id")?;
    let video_ids = match &args.videos_file {
        Some(path) => read_id_column(path, "video_id")?,
        None => Vec::new(),
    };
    let known_inventory_video_ids: HashSet<String> = match &args.inventory_file {
        Some(path) => read_id_column(path, "video_id")?.into_iter().collect(),
        None => HashSet::new(),
    };

    let yesterday_path = config.channel_stats_path(args.panel_name.as_deref(), date - chrono::Duration::days(1));
    let yesterday_channel_video_counts =
        yesterday_path.is_file().then(|| read_channel_video_counts(&yesterday_path));

    let api_key = std::env::var("YOUTUBE_API_KEY").context("YOUTUBE_API_KEY must be set")?;
    let quota = Arc::new(QuotaLog::new(config.quota_log_path(today)));
    let details = YoutubeDataApiProvider::new(api_key, quota, config.sleep_between_calls_ms);

    let panel_name = args.panel_name.clone();
    let collector = PanelCollector::new(
        Box::new(details),
        config.daily_panels_dir().join(format!(
            ".panel_checkpoint_{}_{}.json",
            panel_name.as_deref().unwrap_or("default"),
            date.format("%Y%m%d")
        )),
        config.channel_stats_path(panel_name.as_deref(), date),
        config.video_stats_path(date),
        config.video_inventory_dir().join(format!("{}_inventory.csv", panel_name.as_deref().unwrap_or("default"))),
    );

    let input = PanelInput {
        mode: args.mode.into(),
        channel_ids,
        video_ids,
        date,
        is_backfill: args.backfill,
        yesterday_channel_video_counts,
        known_inventory_video_ids,
    };

    let run_future = collector.run(input);
    tokio::pin!(run_future);
    let summary = tokio::select! {
        result = &mut run_future => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received; letting in-flight batch finish and checkpoint");
            run_future.await
        }
    };

    match summary {
        Ok(summary) if summary.success => {
            tracing::info!(
                channel_rows_written = summary.channel_rows_written,
                video_rows_written = summary.video_rows_written,
                new_videos_detected = summary.new_videos_detected,
                "panel collection complete"
            );
            Ok(())
        }
        Ok(summary) => {
            let message = summary.error.unwrap_or_else(|| "panel collection reported failure".to_string());
            tracing::error!(error = %message, "panel collection failed");
            let sentinel = config.failure_sentinel_path(today);
            let _ = std::fs::write(&sentinel, &message);
            Err(anyhow::anyhow!(message))
        }
        Err(err) => {
            tracing::error!(error = %err, "panel collection failed");
            let sentinel = config.failure_sentinel_path(today);
            let _ = std::fs::write(&sentinel, err.to_string());
            Err(err.into())
        }
    }
}
