//! Renders the week's markdown summary and writes it under `data/digests/`,
//! printing the same text to stdout so it can be piped straight into a
//! notification channel.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use youtube_panel::config::PipelineConfig;
use youtube_panel::digest::WeeklyDigest;

#[derive(Parser, Debug)]
#[command(about = "Render the weekly collection digest")]
struct Args {
    #[arg(long)]
    panel_name: Option<String>,

    #[arg(long)]
    cohort: Option<String>,

    #[arg(long)]
    project_root: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PipelineConfig::load().context("loading configuration")?;
    if let Some(root) = &args.project_root {
        config.project_root = root.clone();
    }
    config.ensure_directories().context("bootstrapping data directories")?;

    let digest = WeeklyDigest {
        channel_stats_dir: config.channel_stats_dir(args.panel_name.as_deref()),
        video_stats_dir: config.video_stats_dir(),
        inventory_path: config.inventory_path(args.cohort.as_deref().unwrap_or("default")),
        daily_panels_dir: config.daily_panels_dir(),
        logs_dir: config.logs_dir(),
    };

    let now = chrono::Utc::now();
    let report = digest.generate(now);
    print!("{report}");

    let digests_dir = config.data_root().join("digests");
    std::fs::create_dir_all(&digests_dir).context("creating digests directory")?;
    let out_path = digests_dir.join(format!("weekly_digest_{}.md", now.format("%Y%m%d")));
    std::fs::write(&out_path, &report).with_context(|| format!("writing {}", out_path.display()))?;

    Ok(())
}
