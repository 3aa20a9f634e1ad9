use super::{overall_severity, CheckResult, Severity};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const ERROR_PATTERNS: [&str; 4] = ["ERROR", "CRITICAL", "Exception", "Traceback"];
const STDERR_TAIL_LINES: usize = 50;
const MIN_INVENTORY_ROWS: u64 = 50_000;
const DISK_USAGE_WARN_PCT: f64 = 80.0;
const QUOTA_WARN_THRESHOLD: u64 = 900_000;
const CHECKPOINT_STALE_HOURS: i64 = 24;

/// Grades nine independent signals of pipeline health and reduces them to a
/// single HEALTHY / DEGRADED / FAILING verdict via the max severity.
pub struct WeeklyHealthReport {
    pub channel_stats_dir: PathBuf,
    pub video_stats_dir: PathBuf,
    pub stderr_log_paths: Vec<PathBuf>,
    pub inventory_path: PathBuf,
    pub disk_root: PathBuf,
    pub quota_log_candidates: Vec<PathBuf>,
    pub checkpoint_path: Option<PathBuf>,
    pub expected_channel_count: u64,
    pub channel_count_tolerance: f64,
    pub required_channel_stats_columns: Vec<String>,
}

impl WeeklyHealthReport {
    pub fn run(&self, today: NaiveDate) -> Vec<CheckResult> {
        vec![
            self.check_channel_stats_freshness(today),
            self.check_channel_stats_completeness(),
            self.check_video_stats_freshness(today),
            self.check_log_errors(),
            self.check_inventory_integrity(),
            self.check_disk_space(),
            self.check_quota_usage(),
            self.check_stale_checkpoint(),
        ]
    }

    pub fn exit_code(results: &[CheckResult]) -> i32 {
        overall_severity(results).exit_code()
    }

    fn latest_dated_csv(dir: &Path) -> Option<(PathBuf, NaiveDate)> {
        let mut dated: Vec<(PathBuf, NaiveDate)> = fs::read_dir(dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                    return None;
                }
                let stem = path.file_stem()?.to_str()?.to_string();
                let date = NaiveDate::parse_from_str(&stem, "%Y-%m-%d").ok()?;
                Some((path, date))
            })
            .collect();
        dated.sort_by_key(|(_, date)| *date);
        dated.pop()
    }

    fn check_channel_stats_freshness(&self, today: NaiveDate) -> CheckResult {
        match Self::latest_dated_csv(&self.channel_stats_dir) {
            None => CheckResult::critical("channel_stats_freshness", "no channel stats files found"),
            Some((path, date)) => {
                let days_ago = (today - date).num_days();
                let name = file_name(&path);
                let message = format!("latest: {name} ({days_ago} day(s) ago)");
                let details = json!({"latest_file": name, "days_since_last": days_ago});
                if days_ago <= 1 {
                    CheckResult::ok("channel_stats_freshness", message).with_details(details)
                } else if days_ago <= 3 {
                    CheckResult::warning("channel_stats_freshness", message).with_details(details)
                } else {
                    CheckResult::critical("channel_stats_freshness", message).with_details(details)
                }
            }
        }
    }

    fn check_channel_stats_completeness(&self) -> CheckResult {
        let Some((path, _)) = Self::latest_dated_csv(&self.channel_stats_dir) else {
            return CheckResult::critical("channel_stats_completeness", "no channel stats files to validate");
        };
        let mut reader = match csv::Reader::from_path(&path) {
            Ok(r) => r,
            Err(err) => {
                return CheckResult::critical("channel_stats_completeness", format!("failed to read {}: {err}", file_name(&path)))
            }
        };
        let header: Vec<String> = reader.headers().map(|h| h.iter().map(str::to_string).collect()).unwrap_or_default();
        let row_count = reader.records().count();

        let mut problems = Vec::new();
        let missing: Vec<&String> =
            self.required_channel_stats_columns.iter().filter(|c| !header.contains(c)).collect();
        if !missing.is_empty() {
            problems.push(format!("missing columns: {missing:?}"));
        }
        let lower = (self.expected_channel_count as f64 * (1.0 - self.channel_count_tolerance)) as i64;
        let upper = (self.expected_channel_count as f64 * (1.0 + self.channel_count_tolerance)) as i64;
        if (row_count as i64) < lower || (row_count as i64) > upper {
            problems.push(format!("row count {row_count} outside expected [{lower}, {upper}]"));
        }

        let name = file_name(&path);
        if problems.is_empty() {
            CheckResult::ok("channel_stats_completeness", format!("{name}: {row_count} rows, all columns present"))
        } else {
            let status = if row_count > 0 { Severity::Warning } else { Severity::Critical };
            let message = format!("{name}: {}", problems.join("; "));
            let details = json!({"file": name, "row_count": row_count});
            CheckResult { name: "channel_stats_completeness".to_string(), status, message, details }
        }
    }

    fn check_video_stats_freshness(&self, today: NaiveDate) -> CheckResult {
        match Self::latest_dated_csv(&self.video_stats_dir) {
            None => CheckResult::warning("video_stats_freshness", "no video stats files found"),
            Some((path, date)) => {
                let days_ago = (today - date).num_days();
                let name = file_name(&path);
                if days_ago <= 8 {
                    CheckResult::ok("video_stats_freshness", format!("latest: {name} ({days_ago} day(s) ago)"))
                } else {
                    CheckResult::warning("video_stats_freshness", format!("video stats {days_ago} days stale (latest: {name})"))
                }
            }
        }
    }

    fn check_log_errors(&self) -> CheckResult {
        let mut found: Vec<(String, Vec<String>)> = Vec::new();
        for log_path in &self.stderr_log_paths {
            if !log_path.is_file() {
                continue;
            }
            let lines = tail_lines(log_path, STDERR_TAIL_LINES);
            let matches: Vec<String> =
                lines.into_iter().filter(|line| ERROR_PATTERNS.iter().any(|p| line.contains(p))).collect();
            if !matches.is_empty() {
                found.push((file_name(log_path), matches));
            }
        }
        if found.is_empty() {
            return CheckResult::ok("log_errors", "no errors in recent stderr logs");
        }
        let total: usize = found.iter().map(|(_, m)| m.len()).sum();
        let details = json!({"errors_by_file": found.iter().map(|(name, m)| (name.clone(), m.iter().take(5).collect::<Vec<_>>())).collect::<std::collections::BTreeMap<_, _>>()});
        CheckResult::warning("log_errors", format!("found {total} error line(s) across {} log file(s)", found.len()))
            .with_details(details)
    }

    fn check_inventory_integrity(&self) -> CheckResult {
        if !self.inventory_path.is_file() {
            return CheckResult::critical("inventory_integrity", format!("video inventory not found: {}", file_name(&self.inventory_path)));
        }
        let row_count = match csv::Reader::from_path(&self.inventory_path) {
            Ok(mut reader) => reader.records().count() as u64,
            Err(err) => return CheckResult::critical("inventory_integrity", format!("failed to read inventory: {err}")),
        };
        if row_count < MIN_INVENTORY_ROWS {
            CheckResult::warning(
                "inventory_integrity",
                format!("inventory has only {row_count} rows (expected >{MIN_INVENTORY_ROWS})"),
            )
            .with_details(json!({"row_count": row_count}))
        } else {
            CheckResult::ok("inventory_integrity", format!("inventory has {row_count} videos"))
        }
    }

    fn check_disk_space(&self) -> CheckResult {
        use sysinfo::Disks;
        let disks = Disks::new_with_refreshed_list();
        let target = self.disk_root.as_path();
        let disk = disks
            .iter()
            .filter(|d| target.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len());

        let Some(disk) = disk else {
            return CheckResult::warning("disk_space", "could not determine disk usage");
        };
        let total = disk.total_space() as f64;
        let available = disk.available_space() as f64;
        if total == 0.0 {
            return CheckResult::warning("disk_space", "could not determine disk usage");
        }
        let used_pct = ((total - available) / total) * 100.0;
        let free_gb = available / (1024.0 * 1024.0 * 1024.0);
        let message = format!("disk at {used_pct:.1}% ({free_gb:.1} GB free)");
        if used_pct >= DISK_USAGE_WARN_PCT {
            CheckResult::warning("disk_space", message)
        } else {
            CheckResult::ok("disk_space", message)
        }
    }

    fn check_quota_usage(&self) -> CheckResult {
        let Some(quota_path) = self.quota_log_candidates.iter().find(|p| p.is_file()) else {
            return CheckResult::warning("quota_usage", "no recent quota log (last 3 days)");
        };
        let mut total_units: u64 = 0;
        match csv::Reader::from_path(quota_path) {
            Ok(mut reader) => {
                for record in reader.deserialize::<QuotaRow>().flatten() {
                    total_units += record.units as u64;
                }
            }
            Err(err) => return CheckResult::warning("quota_usage", format!("could not parse {}: {err}", file_name(quota_path))),
        }
        let name = file_name(quota_path);
        if total_units >= QUOTA_WARN_THRESHOLD {
            CheckResult::warning("quota_usage", format!("quota high: {total_units} units ({name})"))
        } else {
            CheckResult::ok("quota_usage", format!("quota: {total_units} units ({name})"))
        }
    }

    fn check_stale_checkpoint(&self) -> CheckResult {
        let Some(path) = &self.checkpoint_path else {
            return CheckResult::ok("stale_checkpoint", "no checkpoint (clean state)");
        };
        if !path.is_file() {
            return CheckResult::ok("stale_checkpoint", "no checkpoint (clean state)");
        }
        let age_hours = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => match modified.elapsed() {
                Ok(elapsed) => elapsed.as_secs_f64() / 3600.0,
                Err(_) => 0.0,
            },
            Err(err) => return CheckResult::warning("stale_checkpoint", format!("could not stat checkpoint: {err}")),
        };
        if age_hours > CHECKPOINT_STALE_HOURS as f64 {
            CheckResult::critical("stale_checkpoint", format!("stale checkpoint: {age_hours:.1}h old, collection run likely failed"))
                .with_details(json!({"age_hours": age_hours}))
        } else {
            CheckResult::ok("stale_checkpoint", format!("checkpoint exists, recent ({age_hours:.1}h old, likely in-progress)"))
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct QuotaRow {
    #[serde(default)]
    units: u32,
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

fn tail_lines(path: &Path, n: usize) -> Vec<String> {
    let Ok(file) = fs::File::open(path) else { return Vec::new() };
    let lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}

pub fn quota_log_candidates(logs_dir: &Path, today: NaiveDate) -> Vec<PathBuf> {
    (0..3)
        .map(|offset| {
            let date = today - chrono::Duration::days(offset);
            logs_dir.join(format!("quota_{}.csv", date.format("%Y%m%d")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(dir: &Path) -> WeeklyHealthReport {
        WeeklyHealthReport {
            channel_stats_dir: dir.join("channel_stats"),
            video_stats_dir: dir.join("video_stats"),
            stderr_log_paths: Vec::new(),
            inventory_path: dir.join("inventory.csv"),
            disk_root: dir.to_path_buf(),
            quota_log_candidates: Vec::new(),
            checkpoint_path: None,
            expected_channel_count: 100,
            channel_count_tolerance: 0.01,
            required_channel_stats_columns: vec!["channel_id".to_string()],
        }
    }

    #[test]
    fn missing_channel_stats_dir_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        let rpt = report(dir.path());
        let result = rpt.check_channel_stats_freshness(Utc::now().date_naive());
        assert_eq!(result.status, Severity::Critical);
    }

    #[test]
    fn fresh_channel_stats_file_passes() {
        let dir = tempfile::tempdir().unwrap();
        let stats_dir = dir.path().join("channel_stats");
        fs::create_dir_all(&stats_dir).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 2, 22).unwrap();
        fs::write(stats_dir.join(format!("{}.csv", today.format("%Y-%m-%d"))), "channel_id\nUC1\n").unwrap();

        let rpt = report(dir.path());
        let result = rpt.check_channel_stats_freshness(today);
        assert_eq!(result.status, Severity::Ok);
    }

    #[test]
    fn missing_inventory_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        let rpt = report(dir.path());
        assert_eq!(rpt.check_inventory_integrity().status, Severity::Critical);
    }

    #[test]
    fn no_checkpoint_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let rpt = report(dir.path());
        assert_eq!(rpt.check_stale_checkpoint().status, Severity::Ok);
    }

    #[test]
    fn quota_log_candidates_lists_three_most_recent_days() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 2, 22).unwrap();
        let candidates = quota_log_candidates(dir.path(), today);
        assert_eq!(candidates.len(), 3);
        assert!(candidates[0].ends_with("quota_20260222.csv"));
    }
}
