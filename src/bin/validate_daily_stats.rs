//! Validates one day's channel-stats CSV on its own: row count, schema,
//! null/negative values, dtypes, and a day-over-day subscriber-drop check.
//! On critical failure, writes the same failure sentinel the collectors
//! check for so downstream jobs can refuse to run against a bad file.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use youtube_panel::config::PipelineConfig;
use youtube_panel::health::{DailyStatsValidator, Severity};

#[derive(Parser, Debug)]
#[command(about = "Validate a single day's channel-stats CSV")]
struct Args {
    #[arg(long)]
    panel_name: Option<String>,

    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long, default_value_t = 0)]
    expected_row_count: u64,

    #[arg(long)]
    project_root: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PipelineConfig::load().context("loading configuration")?;
    if let Some(root) = &args.project_root {
        config.project_root = root.clone();
    }
    let today = chrono::Utc::now().date_naive();
    let date = args.date.unwrap_or(today);

    let validator = DailyStatsValidator {
        panel_dir: config.channel_stats_dir(args.panel_name.as_deref()),
        expected_row_count: args.expected_row_count,
        required_columns: vec![
            "channel_id".to_string(),
            "view_count".to_string(),
            "subscriber_count".to_string(),
            "video_count".to_string(),
            "scraped_at".to_string(),
        ],
    };

    let results = validator.run(date);
    for result in &results {
        println!("[{:?}] {}: {}", result.status, result.name, result.message);
    }

    let exit_code = DailyStatsValidator::exit_code(&results);
    if results.iter().any(|r| r.status == Severity::Critical) {
        let sentinel = config.failure_sentinel_path(date);
        let summary: Vec<&str> = results
            .iter()
            .filter(|r| r.status == Severity::Critical)
            .map(|r| r.message.as_str())
            .collect();
        let _ = std::fs::write(&sentinel, summary.join("\n"));
    }
    std::process::exit(exit_code);
}
