//! Runs either the fast daily spot check or the richer weekly grading
//! report, prints each finding, and exits with the worst severity's code.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use youtube_panel::config::PipelineConfig;
use youtube_panel::health::{self, DailyHealthCheck, WeeklyHealthReport};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReportKind {
    Daily,
    Weekly,
}

#[derive(Parser, Debug)]
#[command(about = "Check the collection pipeline's health")]
struct Args {
    #[arg(long, value_enum, default_value_t = ReportKind::Daily)]
    kind: ReportKind,

    #[arg(long)]
    panel_name: Option<String>,

    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long, default_value_t = 0)]
    expected_row_count: usize,

    #[arg(long, default_value_t = 0)]
    expected_channel_count: u64,

    #[arg(long, default_value_t = 0.01)]
    channel_count_tolerance: f64,

    #[arg(long)]
    project_root: Option<PathBuf>,
}

fn print_results(results: &[health::CheckResult]) {
    for result in results {
        println!("[{:?}] {}: {}", result.status, result.name, result.message);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PipelineConfig::load().context("loading configuration")?;
    if let Some(root) = &args.project_root {
        config.project_root = root.clone();
    }
    let today = chrono::Utc::now().date_naive();
    let date = args.date.unwrap_or(today);

    match args.kind {
        ReportKind::Daily => {
            let check = DailyHealthCheck {
                channel_stats_path: config.channel_stats_path(args.panel_name.as_deref(), date),
                secondary_panel_path: Some(config.video_stats_path(date)),
                failure_sentinel_paths: vec![config.failure_sentinel_path(date)],
                expected_row_count: (args.expected_row_count > 0).then_some(args.expected_row_count),
            };
            let results = check.run();
            print_results(&results);
            std::process::exit(DailyHealthCheck::exit_code(&results));
        }
        ReportKind::Weekly => {
            let report = WeeklyHealthReport {
                channel_stats_dir: config.channel_stats_dir(args.panel_name.as_deref()),
                video_stats_dir: config.video_stats_dir(),
                stderr_log_paths: (0..7)
                    .map(|offset| config.log_file_path("panel_collect", today - chrono::Duration::days(offset)))
                    .collect(),
                inventory_path: config.inventory_path(args.panel_name.as_deref().unwrap_or("default")),
                disk_root: config.data_root(),
                quota_log_candidates: health::quota_log_candidates(&config.logs_dir(), today),
                checkpoint_path: None,
                expected_channel_count: args.expected_channel_count,
                channel_count_tolerance: args.channel_count_tolerance,
                required_channel_stats_columns: vec![
                    "channel_id".to_string(),
                    "view_count".to_string(),
                    "subscriber_count".to_string(),
                    "video_count".to_string(),
                    "scraped_at".to_string(),
                ],
            };
            let results = report.run(today);
            print_results(&results);
            std::process::exit(WeeklyHealthReport::exit_code(&results));
        }
    }
}
