//! Append-only CSV output: the header is written once on file creation, and
//! every later run appends new rows without re-reading what is already on
//! disk. [`AppendOnlyCsvWriter::rewrite`] is the exception, used when a row
//! already written needs to change in place (e.g. a first-seen-wins update).

use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

pub struct AppendOnlyCsvWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> AppendOnlyCsvWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        AppendOnlyCsvWriter { path, _marker: PhantomData }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `row`, writing the header first if the file does not exist yet.
    pub fn append(&self, row: &T) -> Result<(), csv::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(err) if err.kind() == ErrorKind::NotFound => true,
            Err(err) => return Err(err.into()),
        };

        let file = std::fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads every row currently on disk. Returns an empty vec if the file
    /// does not exist yet.
    pub fn read_all(&self) -> Result<Vec<T>, csv::Error> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        reader.deserialize().collect()
    }

    /// Atomically replaces the file's entire contents with `rows`, via a
    /// temp-file-then-rename so a crash mid-write never leaves a truncated
    /// file in the file's place.
    pub fn rewrite(&self, rows: &[T]) -> Result<(), csv::Error> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().and_then(|n| n.to_str()).unwrap_or("rewrite")
        ));

        {
            let file = std::fs::File::create(&tmp_path)?;
            let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }

        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: String,
        value: i64,
    }

    #[test]
    fn append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let writer: AppendOnlyCsvWriter<Row> = AppendOnlyCsvWriter::new(dir.path().join("out.csv"));
        writer.append(&Row { id: "a".into(), value: 1 }).unwrap();
        writer.append(&Row { id: "b".into(), value: 2 }).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert_eq!(contents.lines().next().unwrap(), "id,value");
    }

    #[test]
    fn read_all_round_trips_appended_rows() {
        let dir = tempfile::tempdir().unwrap();
        let writer: AppendOnlyCsvWriter<Row> = AppendOnlyCsvWriter::new(dir.path().join("out.csv"));
        writer.append(&Row { id: "a".into(), value: 1 }).unwrap();
        writer.append(&Row { id: "b".into(), value: 2 }).unwrap();

        let rows = writer.read_all().unwrap();
        assert_eq!(rows, vec![Row { id: "a".into(), value: 1 }, Row { id: "b".into(), value: 2 }]);
    }

    #[test]
    fn read_all_on_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let writer: AppendOnlyCsvWriter<Row> = AppendOnlyCsvWriter::new(dir.path().join("missing.csv"));
        assert!(writer.read_all().unwrap().is_empty());
    }

    #[test]
    fn rewrite_replaces_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let writer: AppendOnlyCsvWriter<Row> = AppendOnlyCsvWriter::new(dir.path().join("out.csv"));
        writer.append(&Row { id: "a".into(), value: 1 }).unwrap();
        writer.rewrite(&[Row { id: "z".into(), value: 99 }]).unwrap();

        let rows = writer.read_all().unwrap();
        assert_eq!(rows, vec![Row { id: "z".into(), value: 99 }]);
    }
}
