//! Keyword-driven channel discovery for one stream: expands a keyword list
//! across configured strategies and time windows, dedupes against both the
//! stream's own output and an optional cross-stream exclude file, and
//! checkpoints after every completed pass.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use youtube_panel::config::PipelineConfig;
use youtube_panel::discovery::{DiscoveryDriver, DiscoveryInput};
use youtube_panel::extras::{parse_strategies, EventType};
use youtube_panel::provider::live::YoutubeDataApiProvider;
use youtube_panel::provider::QuotaLog;
use youtube_panel::taxonomy::{intent_keywords, non_intent_keywords};

/// Built-in keyword streams this pipeline tracks. A custom stream can supply
/// its own `--keywords-file` instead of relying on one of these.
fn builtin_keywords(stream: &str) -> Option<Vec<(String, String)>> {
    let pairs = match stream {
        "intent_creators" => intent_keywords(),
        "non_intent_creators" => non_intent_keywords(),
        _ => return None,
    };
    Some(pairs.into_iter().map(|(k, l)| (k.to_string(), l.to_string())).collect())
}

/// Parses a `keyword,language` per line keyword file, skipping blank lines.
fn load_keywords_file(path: &PathBuf) -> Result<Vec<(String, String)>> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading keywords file {}", path.display()))?;
    let mut keywords = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((keyword, language)) = line.split_once(',') else {
            bail!("{}:{}: expected `keyword,language`, got: {line}", path.display(), lineno + 1);
        };
        keywords.push((keyword.trim().to_string(), language.trim().to_string()));
    }
    Ok(keywords)
}

#[derive(Parser, Debug)]
#[command(about = "Discover channels for a stream via keyword search expansion")]
struct Args {
    /// Stream name this discovery run belongs to, e.g. `intent_creators`.
    #[arg(long)]
    stream: String,

    /// Path to a `keyword,language` CSV-ish file overriding the stream's
    /// built-in keyword list.
    #[arg(long)]
    keywords_file: Option<PathBuf>,

    /// Comma-separated expansion strategies, e.g. `base,safesearch,windows`.
    #[arg(long, default_value = "base")]
    strategies: String,

    #[arg(long, default_value_t = 90)]
    days_back: i64,

    #[arg(long, default_value_t = 24)]
    window_hours: i64,

    #[arg(long, default_value_t = 10_000)]
    target_channel_count: usize,

    /// Channels published before this date are dropped (cohort cutoff).
    #[arg(long)]
    cohort_filter: Option<NaiveDate>,

    /// Path to a CSV with a `channel_id` column already claimed by another
    /// stream; discovered channels already in this set are skipped.
    #[arg(long)]
    exclude_ids: Option<PathBuf>,

    #[arg(long, default_value_t = 0.5)]
    relevance_cap_threshold: f64,

    #[arg(long)]
    event_type_completed: bool,

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
    youtube_panel::logging::init("discover", &config.logs_dir()).context("initializing logging")?;

    let keywords = match &args.keywords_file {
        Some(path) => load_keywords_file(path)?,
        None => builtin_keywords(&args.stream)
            .with_context(|| format!("no built-in keyword list for stream `{}`; pass --keywords-file", args.stream))?,
    };
    let strategies = parse_strategies(&args.strategies).map_err(|e| anyhow::anyhow!(e))?;

    let api_key = std::env::var("YOUTUBE_API_KEY").context("YOUTUBE_API_KEY must be set")?;
    let quota = Arc::new(QuotaLog::new(config.quota_log_path(chrono::Utc::now().date_naive())));
    let search = YoutubeDataApiProvider::new(api_key.clone(), quota.clone(), config.sleep_between_calls_ms);
    let details = YoutubeDataApiProvider::new(api_key, quota, config.sleep_between_calls_ms);

    let driver = DiscoveryDriver::new(
        Box::new(search),
        Box::new(details),
        config.discovery_checkpoint_path(&args.stream),
        config.discovery_output_path(&args.stream, chrono::Utc::now().date_naive()),
    );

    let input = DiscoveryInput {
        stream_name: args.stream.clone(),
        keywords,
        strategies,
        exclude_ids: args.exclude_ids,
        days_back: args.days_back,
        window_hours: args.window_hours,
        target_channel_count: args.target_channel_count,
        cohort_filter: args.cohort_filter,
        relevance_cap_threshold: args.relevance_cap_threshold,
        event_type: args.event_type_completed.then_some(EventType::Completed),
    };

    let run_future = driver.run(input);
    tokio::pin!(run_future);
    let summary = tokio::select! {
        result = &mut run_future => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received; letting in-flight pass finish and checkpoint");
            run_future.await
        }
    };

    match summary {
        Ok(summary) => {
            tracing::info!(
                channels_discovered = summary.channels_discovered,
                passes_completed = summary.passes_completed,
                stopped_early = summary.stopped_early,
                "discovery run complete"
            );
            if let Err(err) = driver.enrich_first_videos().await {
                tracing::warn!(error = %err, "first-video enrichment failed, channel rows left unenriched");
            }
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "discovery run failed");
            let sentinel = config.failure_sentinel_path(chrono::Utc::now().date_naive());
            let _ = std::fs::write(&sentinel, err.to_string());
            Err(err.into())
        }
    }
}
