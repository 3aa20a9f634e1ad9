use super::{CheckResult, Severity};
use chrono::{DateTime, NaiveDate};
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const NUMERIC_FIELDS: [&str; 3] = ["view_count", "subscriber_count", "video_count"];
const MAX_SUBSCRIBER_DROP_PCT: f64 = 0.50;
const ROW_COUNT_TOLERANCE: f64 = 0.01;

/// Runs the sanity checks against a single day's channel-stats CSV:
/// row count, schema, null/negative values, parseability, and a
/// day-over-day subscriber-drop comparison against the previous day's file
/// in the same directory.
pub struct DailyStatsValidator {
    pub panel_dir: PathBuf,
    pub expected_row_count: u64,
    pub required_columns: Vec<String>,
}

impl DailyStatsValidator {
    pub fn run(&self, date: NaiveDate) -> Vec<CheckResult> {
        let file_path = self.panel_dir.join(format!("{}.csv", date.format("%Y-%m-%d")));
        if !file_path.is_file() {
            return vec![CheckResult::critical("file_exists", format!("file not found: {}", file_path.display()))];
        }

        let (header, rows) = match read_csv(&file_path) {
            Ok(parsed) => parsed,
            Err(err) => return vec![CheckResult::critical("file_readable", format!("failed to read file: {err}"))],
        };

        let mut results = Vec::new();
        results.push(self.check_row_count(rows.len()));
        results.push(self.check_schema_columns(&header));
        results.push(check_null_channel_ids(&rows));
        results.push(check_negative_values(&rows));
        results.push(check_dtypes(&rows));
        results.push(self.check_subscriber_drops(&rows, date));
        results
    }

    pub fn exit_code(results: &[CheckResult]) -> i32 {
        super::overall_severity(results).exit_code()
    }

    fn check_row_count(&self, row_count: usize) -> CheckResult {
        let expected = self.expected_row_count as f64;
        let lower = (expected * (1.0 - ROW_COUNT_TOLERANCE)) as i64;
        let upper = (expected * (1.0 + ROW_COUNT_TOLERANCE)) as i64;
        if (row_count as i64) >= lower && (row_count as i64) <= upper {
            CheckResult::ok("row_count", format!("{row_count} rows (expected {} +/-1%)", self.expected_row_count))
        } else {
            let status = if row_count > 0 { Severity::Warning } else { Severity::Critical };
            let message = format!("{row_count} rows, expected [{lower}, {upper}]");
            CheckResult { name: "row_count".to_string(), status, message, details: json!({"actual": row_count, "expected": self.expected_row_count}) }
        }
    }

    fn check_schema_columns(&self, header: &[String]) -> CheckResult {
        let missing: Vec<&String> = self.required_columns.iter().filter(|c| !header.contains(c)).collect();
        if missing.is_empty() {
            CheckResult::ok("schema_columns", format!("all {} required columns present", self.required_columns.len()))
        } else {
            CheckResult::critical("schema_columns", format!("missing columns: {missing:?}"))
        }
    }

    fn check_subscriber_drops(&self, rows: &[HashMap<String, String>], date: NaiveDate) -> CheckResult {
        let prev_date = date - chrono::Duration::days(1);
        let prev_path = self.panel_dir.join(format!("{}.csv", prev_date.format("%Y-%m-%d")));
        if !prev_path.is_file() {
            return CheckResult::ok(
                "subscriber_drops",
                format!("no previous day file ({}) -- skipping day-over-day check", prev_date.format("%Y-%m-%d")),
            );
        }

        let prev_subs: HashMap<String, i64> = match read_csv(&prev_path) {
            Ok((_, prev_rows)) => prev_rows
                .iter()
                .filter_map(|row| {
                    let cid = row.get("channel_id")?.trim();
                    let sub = row.get("subscriber_count")?.trim();
                    if cid.is_empty() || sub.is_empty() {
                        return None;
                    }
                    sub.parse::<i64>().ok().map(|v| (cid.to_string(), v))
                })
                .collect(),
            Err(_) => HashMap::new(),
        };

        let mut big_drops = Vec::new();
        for row in rows {
            let Some(cid) = row.get("channel_id").map(|s| s.trim()) else { continue };
            let Some(&prev_sub) = prev_subs.get(cid) else { continue };
            let Some(sub_str) = row.get("subscriber_count").map(|s| s.trim()) else { continue };
            let Ok(curr_sub) = sub_str.parse::<i64>() else { continue };
            if prev_sub > 0 && (curr_sub as f64) < (prev_sub as f64) * (1.0 - MAX_SUBSCRIBER_DROP_PCT) {
                let drop_pct = (prev_sub - curr_sub) as f64 / prev_sub as f64 * 100.0;
                big_drops.push(format!("{cid}: {prev_sub} -> {curr_sub} (-{drop_pct:.1}%)"));
            }
        }

        if big_drops.is_empty() {
            CheckResult::ok("subscriber_drops", "no extreme subscriber drops vs previous day")
        } else {
            let count = big_drops.len();
            CheckResult::warning("subscriber_drops", format!("{count} channels with >50% subscriber drop"))
                .with_details(json!({"examples": big_drops.into_iter().take(5).collect::<Vec<_>>()}))
        }
    }
}

fn check_null_channel_ids(rows: &[HashMap<String, String>]) -> CheckResult {
    let null_ids = rows.iter().filter(|r| r.get("channel_id").map(|s| s.trim().is_empty()).unwrap_or(true)).count();
    if null_ids == 0 {
        CheckResult::ok("null_channel_ids", "no null channel_ids")
    } else {
        CheckResult::critical("null_channel_ids", format!("{null_ids} rows with null/empty channel_id"))
    }
}

fn check_negative_values(rows: &[HashMap<String, String>]) -> CheckResult {
    let mut negative_count = 0;
    let mut examples = Vec::new();
    for row in rows {
        for field in NUMERIC_FIELDS {
            let Some(val) = row.get(field).map(|s| s.trim()) else { continue };
            if val.is_empty() {
                continue;
            }
            if let Ok(parsed) = val.parse::<i64>() {
                if parsed < 0 {
                    negative_count += 1;
                    if examples.len() < 3 {
                        examples.push(format!("{}: {field}={val}", row.get("channel_id").map(String::as_str).unwrap_or("?")));
                    }
                }
            }
        }
    }
    if negative_count == 0 {
        CheckResult::ok("negative_values", "no negative count values")
    } else {
        CheckResult::critical("negative_values", format!("{negative_count} negative values found")).with_details(json!({"examples": examples}))
    }
}

fn check_dtypes(rows: &[HashMap<String, String>]) -> CheckResult {
    let mut non_numeric = 0;
    let mut examples = Vec::new();
    for row in rows {
        for field in NUMERIC_FIELDS {
            let Some(val) = row.get(field).map(|s| s.trim()) else { continue };
            if val.is_empty() {
                continue;
            }
            if val.parse::<i64>().is_err() {
                non_numeric += 1;
                if examples.len() < 3 {
                    examples.push(format!("{}: {field}='{val}'", row.get("channel_id").map(String::as_str).unwrap_or("?")));
                }
            }
        }
    }

    let unparseable_dates = rows
        .iter()
        .filter(|row| {
            row.get("scraped_at")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| DateTime::parse_from_rfc3339(s).is_err())
                .unwrap_or(false)
        })
        .count();

    let issues = non_numeric + unparseable_dates;
    if issues == 0 {
        CheckResult::ok("schema_dtypes", "all counts numeric, all timestamps parseable")
    } else {
        let mut parts = Vec::new();
        if non_numeric > 0 {
            parts.push(format!("{non_numeric} non-numeric count values"));
        }
        if unparseable_dates > 0 {
            parts.push(format!("{unparseable_dates} unparseable timestamps"));
        }
        CheckResult::warning("schema_dtypes", parts.join("; ")).with_details(json!({"non_numeric_examples": examples}))
    }
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<HashMap<String, String>>), csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: HashMap<String, String> =
            header.iter().cloned().zip(record.iter().map(str::to_string)).collect();
        rows.push(row);
    }
    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(dir: &Path) -> DailyStatsValidator {
        DailyStatsValidator {
            panel_dir: dir.to_path_buf(),
            expected_row_count: 2,
            required_columns: vec!["channel_id".to_string(), "subscriber_count".to_string()],
        }
    }

    #[test]
    fn missing_file_is_a_single_critical_result() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path());
        let results = v.run(NaiveDate::from_ymd_opt(2026, 2, 22).unwrap());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, Severity::Critical);
    }

    #[test]
    fn clean_file_passes_every_check() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("2026-02-22.csv"),
            "channel_id,subscriber_count,view_count,video_count,scraped_at\nUC1,100,1000,10,2026-02-22T00:00:00Z\nUC2,200,2000,20,2026-02-22T00:00:00Z\n",
        )
        .unwrap();
        let v = validator(dir.path());
        let results = v.run(NaiveDate::from_ymd_opt(2026, 2, 22).unwrap());
        assert_eq!(DailyStatsValidator::exit_code(&results), 0);
    }

    #[test]
    fn missing_required_column_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2026-02-22.csv"), "channel_id\nUC1\nUC2\n").unwrap();
        let v = validator(dir.path());
        let results = v.run(NaiveDate::from_ymd_opt(2026, 2, 22).unwrap());
        let schema = results.iter().find(|r| r.name == "schema_columns").unwrap();
        assert_eq!(schema.status, Severity::Critical);
    }

    #[test]
    fn subscriber_drop_over_50_percent_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("2026-02-21.csv"),
            "channel_id,subscriber_count,view_count,video_count,scraped_at\nUC1,1000,1000,10,2026-02-21T00:00:00Z\nUC2,500,500,5,2026-02-21T00:00:00Z\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("2026-02-22.csv"),
            "channel_id,subscriber_count,view_count,video_count,scraped_at\nUC1,100,1000,10,2026-02-22T00:00:00Z\nUC2,500,500,5,2026-02-22T00:00:00Z\n",
        )
        .unwrap();
        let v = validator(dir.path());
        let results = v.run(NaiveDate::from_ymd_opt(2026, 2, 22).unwrap());
        let drops = results.iter().find(|r| r.name == "subscriber_drops").unwrap();
        assert_eq!(drops.status, Severity::Warning);
    }
}
