//! Typed configuration surface and directory bootstrap.
//!
//! Loaded defaults → `config/default.toml` → `YTPANEL_*` environment →
//! CLI flag overrides applied in `main()`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MAX_RESULTS_PER_PAGE: u32 = 50;
pub const SHORTS_MAX_DURATION_SECONDS: u64 = 180;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub project_root: PathBuf,
    pub cohort_cutoff_date: NaiveDate,
    pub sleep_between_calls_ms: u64,
    pub max_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            project_root: PathBuf::from("."),
            cohort_cutoff_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            sleep_between_calls_ms: 100,
            max_retries: 5,
        }
    }
}

impl PipelineConfig {
    /// Layers defaults, an optional `config/default.toml`, and `YTPANEL_*`
    /// environment variables, in that order.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&PipelineConfig::default())?)
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("YTPANEL").separator("__"));
        builder.build()?.try_deserialize()
    }

    pub fn data_root(&self) -> PathBuf {
        self.project_root.join("data")
    }

    pub fn channels_dir(&self, stream: &str) -> PathBuf {
        self.data_root().join("channels").join(stream)
    }

    pub fn video_inventory_dir(&self) -> PathBuf {
        self.data_root().join("video_inventory")
    }

    pub fn daily_panels_dir(&self) -> PathBuf {
        self.data_root().join("daily_panels")
    }

    pub fn channel_stats_dir(&self, panel_name: Option<&str>) -> PathBuf {
        match panel_name {
            Some(name) => self.daily_panels_dir().join("channel_stats").join(name),
            None => self.daily_panels_dir().join("channel_stats"),
        }
    }

    pub fn video_stats_dir(&self) -> PathBuf {
        self.daily_panels_dir().join("video_stats")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_root().join("logs")
    }

    /// Creates the full data tree. Kept separate from the pure path builders
    /// so it stays the only fallible, side-effecting method on this type.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [
            self.data_root().join("channels"),
            self.video_inventory_dir(),
            self.channel_stats_dir(None),
            self.video_stats_dir(),
            self.logs_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn channel_stats_path(&self, panel_name: Option<&str>, date: NaiveDate) -> PathBuf {
        self.channel_stats_dir(panel_name)
            .join(format!("{}.csv", date.format("%Y-%m-%d")))
    }

    pub fn video_stats_path(&self, date: NaiveDate) -> PathBuf {
        self.video_stats_dir()
            .join(format!("{}.csv", date.format("%Y-%m-%d")))
    }

    pub fn trending_log_path(&self, stream: &str, date: NaiveDate) -> PathBuf {
        self.channels_dir(stream)
            .join(format!("trending_log_{}.csv", date.format("%Y-%m-%d")))
    }

    pub fn channel_details_path(&self, stream: &str) -> PathBuf {
        self.channels_dir(stream).join("channel_details.csv")
    }

    pub fn discovery_output_path(&self, stream: &str, date: NaiveDate) -> PathBuf {
        self.channels_dir(stream)
            .join(format!("initial_{}.csv", date.format("%Y%m%d")))
    }

    pub fn discovery_checkpoint_path(&self, stream: &str) -> PathBuf {
        self.channels_dir(stream)
            .join(".discovery_checkpoint.json")
    }

    pub fn inventory_path(&self, cohort: &str) -> PathBuf {
        self.video_inventory_dir()
            .join(format!("{cohort}_inventory.csv"))
    }

    pub fn quota_log_path(&self, date: NaiveDate) -> PathBuf {
        self.logs_dir()
            .join(format!("quota_{}.csv", date.format("%Y%m%d")))
    }

    pub fn failure_sentinel_path(&self, date: NaiveDate) -> PathBuf {
        self.logs_dir()
            .join(format!("daily_stats_FAILED_{}.flag", date.format("%Y-%m-%d")))
    }

    pub fn log_file_path(&self, job: &str, date: NaiveDate) -> PathBuf {
        self.logs_dir()
            .join(format!("{job}_{}.log", date.format("%Y%m%d")))
    }
}

/// Absolute path helper used by CLI binaries that accept a bare filename.
pub fn resolve(root: &Path, maybe_relative: &Path) -> PathBuf {
    if maybe_relative.is_absolute() {
        maybe_relative.to_path_buf()
    } else {
        root.join(maybe_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.sleep_between_calls_ms, 100);
    }

    #[test]
    fn paths_nest_under_project_root() {
        let mut cfg = PipelineConfig::default();
        cfg.project_root = PathBuf::from("/tmp/ytpanel-test");
        assert_eq!(
            cfg.channels_dir("stream_a"),
            PathBuf::from("/tmp/ytpanel-test/data/channels/stream_a")
        );
        assert_eq!(
            cfg.channel_stats_path(None, NaiveDate::from_ymd_opt(2026, 2, 22).unwrap()),
            PathBuf::from("/tmp/ytpanel-test/data/daily_panels/channel_stats/2026-02-22.csv")
        );
        assert_eq!(
            cfg.channel_stats_path(Some("ai_census"), NaiveDate::from_ymd_opt(2026, 2, 22).unwrap()),
            PathBuf::from(
                "/tmp/ytpanel-test/data/daily_panels/channel_stats/ai_census/2026-02-22.csv"
            )
        );
    }
}
