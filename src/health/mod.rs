//! Freshness, completeness, and sanity checking over panel outputs: a daily
//! spot check, a richer weekly report grading nine signals, and a per-file
//! validator for any single daily channel-stats CSV.

mod daily;
mod validate_file;
mod weekly;

pub use daily::DailyHealthCheck;
pub use validate_file::DailyStatsValidator;
pub use weekly::{quota_log_candidates, WeeklyHealthReport};

use serde::Serialize;

/// Ordered so "the overall status is the worst of all checks" is a plain
/// `.max()` over this enum rather than a string-comparison ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
}

impl Severity {
    pub fn exit_code(self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: Severity,
    pub message: String,
    pub details: serde_json::Value,
}

impl CheckResult {
    pub fn ok(name: &str, message: impl Into<String>) -> Self {
        CheckResult { name: name.to_string(), status: Severity::Ok, message: message.into(), details: serde_json::Value::Null }
    }

    pub fn warning(name: &str, message: impl Into<String>) -> Self {
        CheckResult { name: name.to_string(), status: Severity::Warning, message: message.into(), details: serde_json::Value::Null }
    }

    pub fn critical(name: &str, message: impl Into<String>) -> Self {
        CheckResult { name: name.to_string(), status: Severity::Critical, message: message.into(), details: serde_json::Value::Null }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

pub fn overall_severity(results: &[CheckResult]) -> Severity {
    results.iter().map(|r| r.status).max().unwrap_or(Severity::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_severity_is_the_max_across_results() {
        let results = vec![
            CheckResult::ok("a", "fine"),
            CheckResult::warning("b", "hmm"),
            CheckResult::ok("c", "fine"),
        ];
        assert_eq!(overall_severity(&results), Severity::Warning);
    }

    #[test]
    fn overall_severity_of_empty_results_is_ok() {
        assert_eq!(overall_severity(&[]), Severity::Ok);
    }

    #[test]
    fn severity_exit_codes_match_documented_scheme() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
    }
}
