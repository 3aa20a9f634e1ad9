use super::{overall_severity, CheckResult, Severity};
use crate::csv_writer::AppendOnlyCsvWriter;
use crate::model::ChannelSnapshot;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Runs shortly after the panel collector: a fast four-point spot check
/// rather than the richer weekly grading.
pub struct DailyHealthCheck {
    pub channel_stats_path: PathBuf,
    pub secondary_panel_path: Option<PathBuf>,
    pub failure_sentinel_paths: Vec<PathBuf>,
    pub expected_row_count: Option<usize>,
}

impl DailyHealthCheck {
    pub fn run(&self) -> Vec<CheckResult> {
        let mut results = Vec::new();

        if self.channel_stats_path.is_file() {
            results.push(CheckResult::ok(
                "channel_stats_exists",
                format!("{} exists", self.channel_stats_path.display()),
            ));
        } else {
            results.push(CheckResult::critical(
                "channel_stats_exists",
                format!("{} is missing", self.channel_stats_path.display()),
            ));
        }

        if let Some(expected) = self.expected_row_count {
            match row_count(&self.channel_stats_path) {
                Ok(actual) => {
                    let tolerance = (expected as f64 * 0.05).ceil() as i64;
                    let diff = (actual as i64 - expected as i64).abs();
                    if diff <= tolerance {
                        results.push(CheckResult::ok(
                            "channel_stats_row_count",
                            format!("{actual} rows, expected {expected} (+/-5%)"),
                        ));
                    } else {
                        results.push(CheckResult::critical(
                            "channel_stats_row_count",
                            format!("{actual} rows, expected {expected} (+/-5%)"),
                        ));
                    }
                }
                Err(err) => {
                    results.push(CheckResult::critical("channel_stats_row_count", format!("could not read file: {err}")));
                }
            }
        }

        if let Some(secondary) = &self.secondary_panel_path {
            if secondary.is_file() {
                results.push(CheckResult::ok("secondary_panel_exists", format!("{} exists", secondary.display())));
            } else {
                results.push(CheckResult::critical(
                    "secondary_panel_exists",
                    format!("{} is missing", secondary.display()),
                ));
            }
        }

        let sentinels: Vec<&PathBuf> = self.failure_sentinel_paths.iter().filter(|p| p.is_file()).collect();
        if sentinels.is_empty() {
            results.push(CheckResult::ok("no_failure_sentinels", "no failure sentinel flags present"));
        } else {
            let names: Vec<String> = sentinels.iter().map(|p| p.display().to_string()).collect();
            results.push(CheckResult::critical("no_failure_sentinels", format!("found: {}", names.join(", "))));
        }

        results
    }

    pub fn exit_code(results: &[CheckResult]) -> i32 {
        match overall_severity(results) {
            Severity::Ok => 0,
            _ => 1,
        }
    }
}

fn row_count(path: &Path) -> Result<usize, csv::Error> {
    let writer: AppendOnlyCsvWriter<ChannelSnapshot> = AppendOnlyCsvWriter::new(path.to_path_buf());
    Ok(writer.read_all()?.len())
}

pub fn sentinel_path(logs_dir: &Path, date: NaiveDate) -> PathBuf {
    logs_dir.join(format!("daily_stats_FAILED_{}.flag", date.format("%Y-%m-%d")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_channel_stats_file_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        let check = DailyHealthCheck {
            channel_stats_path: dir.path().join("missing.csv"),
            secondary_panel_path: None,
            failure_sentinel_paths: Vec::new(),
            expected_row_count: None,
        };
        let results = check.run();
        assert_eq!(DailyHealthCheck::exit_code(&results), 1);
    }

    #[test]
    fn present_sentinel_flag_fails_the_check() {
        let dir = tempfile::tempdir().unwrap();
        let stats_path = dir.path().join("stats.csv");
        std::fs::write(&stats_path, "channel_id\n").unwrap();
        let sentinel = dir.path().join("daily_stats_FAILED_2026-02-22.flag");
        std::fs::write(&sentinel, "boom").unwrap();

        let check = DailyHealthCheck {
            channel_stats_path: stats_path,
            secondary_panel_path: None,
            failure_sentinel_paths: vec![sentinel],
            expected_row_count: None,
        };
        let results = check.run();
        assert_eq!(DailyHealthCheck::exit_code(&results), 1);
    }

    #[test]
    fn clean_state_passes_with_exit_code_zero() {
        let dir = tempfile::tempdir().unwrap();
        let stats_path = dir.path().join("stats.csv");
        std::fs::write(&stats_path, "channel_id\nUC1\n").unwrap();

        let check = DailyHealthCheck {
            channel_stats_path: stats_path,
            secondary_panel_path: None,
            failure_sentinel_paths: Vec::new(),
            expected_row_count: None,
        };
        let results = check.run();
        assert_eq!(DailyHealthCheck::exit_code(&results), 0);
    }
}
