//! Weekly markdown summary of collection completeness, growth trends, data
//! volume, and the week's health-check history.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ChannelTrends {
    pub channels_tracked: usize,
    pub avg_subscriber_change: f64,
    pub median_subscriber_change: i64,
    pub avg_view_change: f64,
    pub total_view_growth: i64,
}

pub struct WeeklyDigest {
    pub channel_stats_dir: PathBuf,
    pub video_stats_dir: PathBuf,
    pub inventory_path: PathBuf,
    pub daily_panels_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl WeeklyDigest {
    pub fn generate(&self, now: DateTime<Utc>) -> String {
        let week_end = now.date_naive();
        let week_start = week_end - chrono::Duration::days(7);

        let mut out = String::new();
        let _ = writeln!(out, "# Weekly Digest: Longitudinal Channel Panel");
        let _ = writeln!(out);
        let _ = writeln!(out, "**Generated:** {}", now.format("%Y-%m-%d %H:%M UTC"));
        let _ = writeln!(out, "**Period:** {} to {}", week_start.format("%Y-%m-%d"), week_end.format("%Y-%m-%d"));
        let _ = writeln!(out);
        let _ = writeln!(out, "---");
        let _ = writeln!(out);

        let channel_files = files_in_range(&self.channel_stats_dir, week_start, week_end);
        let _ = writeln!(out, "## Channel Stats");
        let _ = writeln!(out, "- Files collected this week: **{}** (expected 7)", channel_files.len());
        if let Some((path, _)) = channel_files.last() {
            let rows = row_count(path).unwrap_or(0);
            let _ = writeln!(out, "- Latest file: {} ({rows} rows)", file_name(path));
        }
        let _ = writeln!(out);

        let video_files = files_in_range(&self.video_stats_dir, week_start, week_end);
        let _ = writeln!(out, "## Video Stats");
        let _ = writeln!(out, "- Files collected this week: **{}** (expected 1)", video_files.len());
        if let Some((path, _)) = video_files.last() {
            let rows = row_count(path).unwrap_or(0);
            let _ = writeln!(out, "- Latest file: {} ({rows} rows)", file_name(path));
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "## Video Inventory");
        if self.inventory_path.is_file() {
            let rows = row_count(&self.inventory_path).unwrap_or(0);
            let _ = writeln!(out, "- Total videos tracked: **{rows}**");
        } else {
            let _ = writeln!(out, "- Inventory file not found");
        }
        let _ = writeln!(out);

        if channel_files.len() >= 2 {
            if let Some(trends) = compute_channel_trends(&channel_files) {
                let _ = writeln!(out, "## Growth Trends (week-over-week)");
                let _ = writeln!(out, "- Channels tracked: {}", trends.channels_tracked);
                let _ = writeln!(out, "- Avg subscriber change: {:+.1}", trends.avg_subscriber_change);
                let _ = writeln!(out, "- Median subscriber change: {:+}", trends.median_subscriber_change);
                let _ = writeln!(out, "- Avg view change per channel: {:+.0}", trends.avg_view_change);
                let _ = writeln!(out, "- Total view growth across panel: {:+}", trends.total_view_growth);
                let _ = writeln!(out);
            }
        }

        let panel_mb = dir_size_mb(&self.daily_panels_dir);
        let inventory_mb = self.inventory_path.metadata().map(|m| m.len() as f64 / (1024.0 * 1024.0)).unwrap_or(0.0);
        let logs_mb = dir_size_mb(&self.logs_dir);
        let _ = writeln!(out, "## Data Volume");
        let _ = writeln!(out, "- Daily panels: {panel_mb:.1} MB");
        let _ = writeln!(out, "- Video inventory: {inventory_mb:.1} MB");
        let _ = writeln!(out, "- Logs: {logs_mb:.1} MB");
        let _ = writeln!(out, "- **Total: {:.1} MB**", panel_mb + inventory_mb + logs_mb);
        let _ = writeln!(out);

        let issues = health_check_summary(&self.logs_dir, week_start, week_end);
        let _ = writeln!(out, "## Health Check History");
        if issues.is_empty() {
            let _ = writeln!(out, "- All checks passed (or no health check logs found)");
        } else {
            let _ = writeln!(out, "- **{} issue(s) this week:**", issues.len());
            for issue in &issues {
                let _ = writeln!(out, "  - {issue}");
            }
        }
        let _ = writeln!(out);

        out
    }
}

fn files_in_range(dir: &Path, start: NaiveDate, end: NaiveDate) -> Vec<(PathBuf, NaiveDate)> {
    let Ok(entries) = fs::read_dir(dir) else { return Vec::new() };
    let mut files: Vec<(PathBuf, NaiveDate)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let path = e.path();
            if path.extension().and_then(|x| x.to_str()) != Some("csv") {
                return None;
            }
            let stem = path.file_stem()?.to_str()?.to_string();
            let date = NaiveDate::parse_from_str(&stem, "%Y-%m-%d").ok()?;
            (date >= start && date <= end).then_some((path, date))
        })
        .collect();
    files.sort_by_key(|(_, date)| *date);
    files
}

fn row_count(path: &Path) -> std::io::Result<usize> {
    let file = fs::File::open(path)?;
    Ok(std::io::BufRead::lines(std::io::BufReader::new(file)).count().saturating_sub(1))
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

fn dir_size_mb(dir: &Path) -> f64 {
    fn walk(dir: &Path, total: &mut u64) {
        let Ok(entries) = fs::read_dir(dir) else { return };
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                walk(&path, total);
            } else if let Ok(meta) = path.metadata() {
                *total += meta.len();
            }
        }
    }
    let mut total = 0u64;
    walk(dir, &mut total);
    total as f64 / (1024.0 * 1024.0)
}

fn load_channel_stats(path: &Path) -> HashMap<String, (i64, i64)> {
    let Ok(mut reader) = csv::Reader::from_path(path) else { return HashMap::new() };
    let mut stats = HashMap::new();
    for record in reader.deserialize::<ChannelStatsRow>().flatten() {
        let cid = record.channel_id.trim().to_string();
        if !cid.is_empty() {
            stats.insert(cid, (record.subscriber_count.unwrap_or(0), record.view_count.unwrap_or(0)));
        }
    }
    stats
}

#[derive(serde::Deserialize)]
struct ChannelStatsRow {
    channel_id: String,
    #[serde(default)]
    subscriber_count: Option<i64>,
    #[serde(default)]
    view_count: Option<i64>,
}

fn compute_channel_trends(files: &[(PathBuf, NaiveDate)]) -> Option<ChannelTrends> {
    if files.len() < 2 {
        return None;
    }
    let first = load_channel_stats(&files[0].0);
    let last = load_channel_stats(&files[files.len() - 1].0);
    let common: HashSet<&String> = first.keys().filter(|k| last.contains_key(*k)).collect();
    if common.is_empty() {
        return None;
    }

    let mut sub_changes: Vec<i64> = Vec::new();
    let mut view_changes: Vec<i64> = Vec::new();
    for cid in &common {
        let (first_subs, first_views) = first[*cid];
        let (last_subs, last_views) = last[*cid];
        sub_changes.push(last_subs - first_subs);
        view_changes.push(last_views - first_views);
    }
    sub_changes.sort_unstable();

    let count = sub_changes.len();
    Some(ChannelTrends {
        channels_tracked: count,
        avg_subscriber_change: sub_changes.iter().sum::<i64>() as f64 / count as f64,
        median_subscriber_change: sub_changes[count / 2],
        avg_view_change: view_changes.iter().sum::<i64>() as f64 / count as f64,
        total_view_growth: view_changes.iter().sum(),
    })
}

fn health_check_summary(logs_dir: &Path, start: NaiveDate, end: NaiveDate) -> Vec<String> {
    let Ok(entries) = fs::read_dir(logs_dir) else { return Vec::new() };
    let mut issues = Vec::new();
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.file_stem().and_then(|s| s.to_str()).map(|s| s.starts_with("health_check_")).unwrap_or(false))
        .collect();
    files.sort();

    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        let Some(date_str) = stem.strip_prefix("health_check_") else { continue };
        let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y%m%d") else { continue };
        if date < start || date > end {
            continue;
        }
        let Ok(contents) = fs::read_to_string(&path) else { continue };
        let head: String = contents.chars().take(500).collect();
        if head.contains("FAILING") {
            issues.push(format!("{stem}: FAILING"));
        } else if head.contains("DEGRADED") {
            issues.push(format!("{stem}: DEGRADED"));
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_reports_missing_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let digest = WeeklyDigest {
            channel_stats_dir: dir.path().join("channel_stats"),
            video_stats_dir: dir.path().join("video_stats"),
            inventory_path: dir.path().join("inventory.csv"),
            daily_panels_dir: dir.path().join("daily_panels"),
            logs_dir: dir.path().join("logs"),
        };
        fs::create_dir_all(&digest.channel_stats_dir).unwrap();
        fs::create_dir_all(&digest.video_stats_dir).unwrap();
        fs::create_dir_all(&digest.logs_dir).unwrap();

        let report = digest.generate(Utc::now());
        assert!(report.contains("Inventory file not found"));
    }

    #[test]
    fn digest_computes_growth_trends_across_first_and_last_file() {
        let dir = tempfile::tempdir().unwrap();
        let stats_dir = dir.path().join("channel_stats");
        fs::create_dir_all(&stats_dir).unwrap();
        fs::create_dir_all(dir.path().join("video_stats")).unwrap();
        fs::create_dir_all(dir.path().join("logs")).unwrap();

        let now = Utc::now();
        let day0 = now.date_naive() - chrono::Duration::days(6);
        let day1 = now.date_naive();
        fs::write(
            stats_dir.join(format!("{}.csv", day0.format("%Y-%m-%d"))),
            "channel_id,subscriber_count,view_count\nUC1,100,1000\n",
        )
        .unwrap();
        fs::write(
            stats_dir.join(format!("{}.csv", day1.format("%Y-%m-%d"))),
            "channel_id,subscriber_count,view_count\nUC1,150,1500\n",
        )
        .unwrap();

        let digest = WeeklyDigest {
            channel_stats_dir: stats_dir,
            video_stats_dir: dir.path().join("video_stats"),
            inventory_path: dir.path().join("inventory.csv"),
            daily_panels_dir: dir.path().join("daily_panels"),
            logs_dir: dir.path().join("logs"),
        };
        let report = digest.generate(now);
        assert!(report.contains("Growth Trends"));
        assert!(report.contains("Channels tracked: 1"));
    }
}
