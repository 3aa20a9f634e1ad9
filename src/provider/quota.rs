//! Daily quota-unit bookkeeping: an append-only CSV ledger of every call's
//! unit cost, with a running daily total. Logging failures never interrupt
//! the collector that is using the provider.

use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

pub struct QuotaLog {
    path: PathBuf,
    state: Mutex<QuotaState>,
}

struct QuotaState {
    day: NaiveDate,
    cumulative: u64,
}

impl QuotaLog {
    pub fn new(path: PathBuf) -> Self {
        QuotaLog {
            path,
            state: Mutex::new(QuotaState {
                day: Utc::now().date_naive(),
                cumulative: 0,
            }),
        }
    }

    /// Records `units` spent on `endpoint`. Resets the running total when the
    /// UTC day rolls over. Never returns an error: a quota-log write failure
    /// is logged and dropped rather than propagated into the caller's flow.
    pub fn record(&self, endpoint: &str, units: u32) {
        let today = Utc::now().date_naive();
        let (day, cumulative) = {
            let mut state = self.state.lock().unwrap();
            if state.day != today {
                state.day = today;
                state.cumulative = 0;
            }
            state.cumulative += units as u64;
            (state.day, state.cumulative)
        };

        if let Err(err) = self.append_row(day, endpoint, units, cumulative) {
            warn!(error = %err, endpoint, "failed to append quota log row");
        }
    }

    fn append_row(
        &self,
        day: NaiveDate,
        endpoint: &str,
        units: u32,
        cumulative: u64,
    ) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_header = !self.path.exists();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        use std::io::Write;
        if needs_header {
            writeln!(file, "timestamp,endpoint,units,cumulative_daily")?;
        }
        writeln!(
            file,
            "{},{endpoint},{units},{cumulative}",
            Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        )?;
        let _ = day;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_within_the_same_day() {
        let dir = tempfile::tempdir().unwrap();
        let log = QuotaLog::new(dir.path().join("quota.csv"));
        log.record("search.list", 100);
        log.record("channels.list", 1);
        assert_eq!(log.state.lock().unwrap().cumulative, 101);
    }
}
