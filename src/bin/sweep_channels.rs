//! Pairwise sweep comparison: diffs today's channel snapshot file against
//! yesterday's, prints every anomalous transition, and exits with the
//! worst severity found.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use youtube_panel::csv_writer::AppendOnlyCsvWriter;
use youtube_panel::model::ChannelSnapshot;
use youtube_panel::sweep::SweepValidator;

#[derive(Parser, Debug)]
#[command(about = "Compare two channel-snapshot sweeps and report anomalies")]
struct Args {
    /// Today's channel snapshot CSV.
    #[arg(long)]
    current: PathBuf,

    /// Yesterday's channel snapshot CSV, if any. Every channel is treated as
    /// `New` when omitted.
    #[arg(long)]
    previous: Option<PathBuf>,
}

fn load(path: &PathBuf) -> Result<Vec<ChannelSnapshot>> {
    let writer: AppendOnlyCsvWriter<ChannelSnapshot> = AppendOnlyCsvWriter::new(path.clone());
    writer.read_all().with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let current = load(&args.current)?;
    let previous = match &args.previous {
        Some(path) => load(path)?,
        None => Vec::new(),
    };

    let report = SweepValidator::compare(&current, &previous);

    println!("channels compared: {}", report.total_channels);
    for finding in report.anomalies() {
        println!("{}: {:?}", finding.channel_id, finding.transition);
    }
    println!("overall severity: {:?}", report.overall_severity());

    std::process::exit(report.overall_severity().exit_code());
}
