//! Dual-sink log setup: a colored stream to stdout for local dev, and a
//! plain per-job-per-day file under `data/logs/`, mirroring a
//! stream-handler-plus-file-handler setup.

use chrono::Utc;
use std::fs::OpenOptions;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. `job_name` becomes the log file's prefix:
/// `data/logs/<job_name>_<YYYYMMDD>.log`. Safe to call once per process.
pub fn init(job_name: &str, logs_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(logs_dir)?;
    let log_path = logs_dir.join(format!("{job_name}_{}.log", Utc::now().format("%Y%m%d")));
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer().with_ansi(true);
    let file_layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file);

    tracing_subscriber::registry().with(env_filter).with(stdout_layer).with(file_layer).init();
    Ok(())
}
