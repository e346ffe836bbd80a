//! Receipt reporter: one CSV row per input record.
//!
//! Receipts sit outside the transaction. A failed write is reported to the
//! caller but never changes what the run committed or rolled back.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::record::BatchRecord;

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("failed to create receipt directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Receipts are never overwritten; an existing file at `path` lands here.
    #[error("failed to create receipt {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write receipt {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Column order is the receipt's header row.
#[derive(Debug, Serialize)]
struct ReceiptRow<'a> {
    protocol: &'a str,
    gpid: &'a str,
    new_activity_date: String,
    original_activity_date: String,
    status: &'static str,
    message: &'a str,
}

impl<'a> From<&'a BatchRecord> for ReceiptRow<'a> {
    fn from(record: &'a BatchRecord) -> Self {
        Self {
            protocol: record.protocol.as_str(),
            gpid: &record.gpid,
            new_activity_date: record.new_activity_date.to_string(),
            original_activity_date: record
                .original_activity_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            status: record.status.as_str(),
            message: &record.message,
        }
    }
}

const MAX_SUFFIX: u32 = 99;

fn stamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%dT%H%M%S%.6f").to_string()
}

#[derive(Debug, Clone)]
pub struct ReceiptReporter {
    dir: PathBuf,
}

impl ReceiptReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/activity_date_change_<YYYYmmddTHHMMSS.ffffff>.csv`
    pub fn receipt_path(&self, at: DateTime<Local>) -> PathBuf {
        self.dir.join(format!("activity_date_change_{}.csv", stamp(at)))
    }

    /// Write a receipt stamped with the current local time.
    pub fn write(&self, records: &[BatchRecord]) -> Result<PathBuf, ReceiptError> {
        self.write_at(records, Local::now())
    }

    /// On a name clash a numeric suffix is added; earlier receipts are kept.
    fn write_at(&self, records: &[BatchRecord], at: DateTime<Local>) -> Result<PathBuf, ReceiptError> {
        let mut path = self.receipt_path(at);
        let mut attempt = 0u32;
        loop {
            match self.write_to(records, &path) {
                Ok(()) => return Ok(path),
                Err(ReceiptError::Create { source, .. })
                    if source.kind() == ErrorKind::AlreadyExists && attempt < MAX_SUFFIX =>
                {
                    attempt += 1;
                    path = self
                        .dir
                        .join(format!("activity_date_change_{}_{attempt}.csv", stamp(at)));
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn write_to(&self, records: &[BatchRecord], path: &Path) -> Result<(), ReceiptError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ReceiptError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let write_err = |source: csv::Error| ReceiptError::Write {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| ReceiptError::Create {
                path: path.to_path_buf(),
                source,
            })?;
        let mut writer = csv::Writer::from_writer(file);
        if records.is_empty() {
            writer
                .write_record([
                    "protocol",
                    "gpid",
                    "new_activity_date",
                    "original_activity_date",
                    "status",
                    "message",
                ])
                .map_err(write_err)?;
        }
        for record in records {
            writer.serialize(ReceiptRow::from(record)).map_err(write_err)?;
        }
        writer
            .flush()
            .map_err(|e| write_err(csv::Error::from(e)))?;

        tracing::info!(path = %path.display(), rows = records.len(), "receipt written");
        Ok(())
    }
}
