//! Resumable progress tracking: a checkpoint payload is serialized to JSON
//! next to a collector's output file, reloaded on the next run, and used to
//! skip work already recorded there. Every write goes through a temp file in
//! the checkpoint's own directory, then an atomic rename into place.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

pub trait Checkpoint: Serialize + DeserializeOwned + Clone {}
impl<T: Serialize + DeserializeOwned + Clone> Checkpoint for T {}

pub struct CheckpointStore<S> {
    path: PathBuf,
    _marker: std::marker::PhantomData<S>,
}

impl<S: Checkpoint> CheckpointStore<S> {
    pub fn new(path: PathBuf) -> Self {
        CheckpointStore { path, _marker: std::marker::PhantomData }
    }

    /// Loads the checkpoint, if any. A missing file is `Ok(None)`; a corrupt
    /// one is logged and also treated as `Ok(None)` rather than propagated,
    /// since a broken checkpoint should never block a fresh run.
    pub fn load(&self) -> Option<S> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return None,
        };
        match serde_json::from_str(&contents) {
            Ok(checkpoint) => Some(checkpoint),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "checkpoint is corrupt, starting fresh");
                None
            }
        }
    }

    pub fn save(&self, checkpoint: &S) -> std::io::Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        let json = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        use std::io::Write;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        Ok(())
    }

    pub fn clear(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Discovery progress: a flat set of completed `"<keyword>|<language>|<pass>"`
/// work-unit keys, the output file they're writing into, and a running count.
#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq, Eq, Default)]
pub struct DiscoveryCheckpoint {
    pub completed_work_units: BTreeSet<String>,
    pub output_path: PathBuf,
    pub channel_count: usize,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Wraps a checkpoint payload with the date it was written for. Loaders
/// compare `date` against "today" and discard the payload if they differ,
/// since day-scoped collectors (trending, panel) never resume across days.
#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct DateScopedCheckpoint<T> {
    pub date: NaiveDate,
    pub inner: T,
}

impl<T: Checkpoint> DateScopedCheckpoint<T> {
    pub fn for_today(inner: T, today: NaiveDate) -> Self {
        DateScopedCheckpoint { date: today, inner }
    }

    /// Returns `inner` only if `date` matches `today`; a stale checkpoint
    /// from a previous day is discarded rather than resumed from.
    pub fn if_current(self, today: NaiveDate) -> Option<T> {
        if self.date == today {
            Some(self.inner)
        } else {
            None
        }
    }
}

/// Rehydrates an in-memory seen-ID set from the `channel_id` column of a
/// partially-written output CSV, so a checkpoint can be trusted even if it
/// lags behind rows already flushed to disk.
pub fn rehydrate_seen_ids_from_csv(path: &Path, id_column: &str) -> std::io::Result<BTreeSet<String>> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let mut reader = csv::Reader::from_path(path).map_err(csv_to_io_error)?;
    let headers = reader.headers().map_err(csv_to_io_error)?.clone();
    let Some(idx) = headers.iter().position(|h| h == id_column) else {
        return Ok(BTreeSet::new());
    };

    let mut seen = BTreeSet::new();
    for record in reader.records() {
        let record = record.map_err(csv_to_io_error)?;
        if let Some(value) = record.get(idx) {
            seen.insert(value.to_string());
        }
    }
    Ok(seen)
}

fn csv_to_io_error(err: csv::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_checkpoint_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store: CheckpointStore<DiscoveryCheckpoint> =
            CheckpointStore::new(dir.path().join("checkpoint.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store: CheckpointStore<DiscoveryCheckpoint> =
            CheckpointStore::new(dir.path().join("checkpoint.json"));
        let mut checkpoint = DiscoveryCheckpoint::default();
        checkpoint.completed_work_units.insert("ai|english|base".to_string());
        checkpoint.channel_count = 42;
        store.save(&checkpoint).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.channel_count, 42);
        assert!(loaded.completed_work_units.contains("ai|english|base"));
    }

    #[test]
    fn corrupt_checkpoint_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, "{ not valid json").unwrap();
        let store: CheckpointStore<DiscoveryCheckpoint> = CheckpointStore::new(path);
        assert!(store.load().is_none());
    }

    #[test]
    fn date_scoped_checkpoint_discards_when_stale() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let checkpoint = DateScopedCheckpoint::for_today(7u32, yesterday);
        assert_eq!(checkpoint.if_current(today), None);

        let checkpoint = DateScopedCheckpoint::for_today(7u32, today);
        assert_eq!(checkpoint.if_current(today), Some(7));
    }

    #[test]
    fn rehydrate_reads_named_column_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "channel_id,title\nUC1,A\nUC2,B\n").unwrap();
        let seen = rehydrate_seen_ids_from_csv(&path, "channel_id").unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("UC1"));
    }

    #[test]
    fn rehydrate_on_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let seen = rehydrate_seen_ids_from_csv(&dir.path().join("missing.csv"), "channel_id").unwrap();
        assert!(seen.is_empty());
    }
}
