//! Record store backed by a single CSV file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, trace};

use crate::csv;
use crate::error::StoreError;
use crate::record::{HEADER, Record, Row};

/// Ordered, append-only collection of records, persisted in full on flush.
///
/// Each flush writes to a sibling temp file and renames it over the target,
/// so a crash mid-write leaves the previous flush intact.
pub struct RecordStore {
    path: PathBuf,
    records: Vec<Record>,
}

impl RecordStore {
    /// Create an empty store for `path`. Nothing touches disk until [`flush`].
    ///
    /// [`flush`]: RecordStore::flush
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index the next appended record must carry.
    pub fn next_index(&self) -> u64 {
        self.records.len() as u64 + 1
    }

    /// Append a confirmed record. Indices must be gapless from 1.
    pub fn append(&mut self, record: Record) -> Result<&mut Record, StoreError> {
        let expected = self.next_index();
        if record.index != expected {
            return Err(StoreError::OutOfSequence {
                expected,
                got: record.index,
            });
        }
        self.records.push(record);
        let len = self.records.len();
        Ok(&mut self.records[len - 1])
    }

    pub fn latest(&self) -> Option<&Record> {
        self.records.last()
    }

    /// The most recent record, for filling in choices and outcome.
    pub fn latest_mut(&mut self) -> Option<&mut Record> {
        self.records.last_mut()
    }

    /// Serialize header plus every record.
    pub fn render(&self) -> String {
        let mut out = String::new();
        csv::write_row(&mut out, &HEADER);
        for record in &self.records {
            csv::write_row(&mut out, &record.row().to_fields());
        }
        out
    }

    /// Rewrite the whole file from memory.
    pub async fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = self.render();
        let tmp = self.tmp_path();
        fs::write(&tmp, content.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;

        trace!("Flushed {} records to {:?}", self.records.len(), self.path);
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read a store file back into rows. The header line is required.
    pub async fn load(path: &Path) -> Result<Vec<Row>, StoreError> {
        let text = fs::read_to_string(path).await?;
        let mut rows = csv::parse_rows(&text).into_iter();

        match rows.next() {
            Some(header) if header.iter().map(String::as_str).eq(HEADER) => {}
            Some(header) => {
                return Err(StoreError::Malformed {
                    line: 0,
                    message: format!("unexpected header {:?}", header),
                });
            }
            None => {
                return Err(StoreError::Malformed {
                    line: 0,
                    message: "missing header".to_string(),
                });
            }
        }

        let rows = rows
            .enumerate()
            .map(|(i, fields)| Row::from_fields(i + 1, &fields))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Loaded {} rows from {:?}", rows.len(), path);
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
