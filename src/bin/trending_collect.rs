//! Daily trending-chart sweep across every tracked region, appending one
//! sighting row per chart item and growing `channel_details.csv` with any
//! channel not already known.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use youtube_panel::config::PipelineConfig;
use youtube_panel::provider::live::YoutubeDataApiProvider;
use youtube_panel::provider::QuotaLog;
use youtube_panel::trending::TrendingCollector;

#[derive(Parser, Debug)]
#[command(about = "Collect today's trending chart across all tracked regions")]
struct Args {
    /// Stream name the trending chart output is filed under.
    #[arg(long, default_value = "trending")]
    stream: String,

    /// Date to stamp on collected sightings (defaults to today UTC).
    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long)]
    project_root: Option<PathBuf>,
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
    youtube_panel::logging::init("trending_collect", &config.logs_dir()).context("initializing logging")?;

    let today = chrono::Utc::now().date_naive();
    let trending_date = args.date.unwrap_or(today);

    let api_key = std::env::var("YOUTUBE_API_KEY").context("YOUTUBE_API_KEY must be set")?;
    let quota = Arc::new(QuotaLog::new(config.quota_log_path(today)));
    let search = YoutubeDataApiProvider::new(api_key.clone(), quota.clone(), config.sleep_between_calls_ms);
    let details = YoutubeDataApiProvider::new(api_key, quota, config.sleep_between_calls_ms);

    let collector = TrendingCollector::new(
        Box::new(search),
        Box::new(details),
        config.logs_dir().join(format!(".trending_checkpoint_{}.json", trending_date.format("%Y%m%d"))),
        config.trending_log_path(&args.stream, trending_date),
        config.channel_details_path(&args.stream),
    );

    let run_future = collector.run(trending_date);
    tokio::pin!(run_future);
    let summary = tokio::select! {
        result = &mut run_future => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received; letting in-flight region finish and checkpoint");
            run_future.await
        }
    };

    match summary {
        Ok(summary) => {
            tracing::info!(
                sightings = summary.sightings,
                new_channels = summary.new_channels,
                regions_processed = summary.regions_processed,
                "trending collection complete"
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "trending collection failed");
            let sentinel = config.failure_sentinel_path(today);
            let _ = std::fs::write(&sentinel, err.to_string());
            Err(err.into())
        }
    }
}
