//! Full-history video enumeration: pages every channel's uploads playlist to
//! completion and appends every video encountered to the cohort's inventory.
//! Checkpointed per channel, so a resumed run skips channels already done.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use youtube_panel::config::PipelineConfig;
use youtube_panel::inventory::InventoryEnumerator;
use youtube_panel::provider::live::YoutubeDataApiProvider;
use youtube_panel::provider::QuotaLog;

#[derive(Parser, Debug)]
#[command(about = "Enumerate every video ever uploaded by a set of channels")]
struct Args {
    /// Name of the cohort this inventory belongs to, e.g. `intent_creators`.
    #[arg(long)]
    cohort: String,

    /// CSV with a `channel_id` column listing the channels to enumerate.
    #[arg(long)]
    channels_file: PathBuf,

    #[arg(long)]
    project_root: Option<PathBuf>,
}

fn read_channel_ids(path: &PathBuf) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("reading {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let Some(idx) = headers.iter().position(|h| h == "channel_id") else {
        anyhow::bail!("{} has no `channel_id` column", path.display());
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

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = PipelineConfig::load().context("loading configuration")?;
    if let Some(root) = &args.project_root {
        config.project_root = root.clone();
    }
    config.ensure_directories().context("bootstrapping data directories")?;
    youtube_panel::logging::init("enumerate_videos", &config.logs_dir()).context("initializing logging")?;

    let channel_ids = read_channel_ids(&args.channels_file)?;
    let today = chrono::Utc::now().date_naive();

    let api_key = std::env::var("YOUTUBE_API_KEY").context("YOUTUBE_API_KEY must be set")?;
    let quota = Arc::new(QuotaLog::new(config.quota_log_path(today)));
    let details = YoutubeDataApiProvider::new(api_key, quota, config.sleep_between_calls_ms);

    let enumerator = InventoryEnumerator::new(
        Box::new(details),
        config.video_inventory_dir().join(format!(".{}_checkpoint.json", args.cohort)),
        config.inventory_path(&args.cohort),
    );

    let run_future = enumerator.run(&channel_ids);
    tokio::pin!(run_future);
    let summary = tokio::select! {
        result = &mut run_future => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received; letting in-flight channel finish and checkpoint");
            run_future.await
        }
    };

    match summary {
        Ok(summary) => {
            tracing::info!(
                channels_processed = summary.channels_processed,
                videos_written = summary.videos_written,
                channels_skipped_no_playlist = summary.channels_skipped_no_playlist,
                "inventory enumeration complete"
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "inventory enumeration failed");
            let sentinel = config.failure_sentinel_path(today);
            let _ = std::fs::write(&sentinel, err.to_string());
            Err(err.into())
        }
    }
}
