use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::NamedTempFile;

use super::transaction::{SnapshotSink, SnapshotTransaction};
use super::{StoreError, StoreSnapshot, Transaction, UnitOfWork};

/// Store backed by one JSON document.
///
/// A transaction reads the document into memory; commit writes the new
/// document to a temporary file next to it and renames it into place, so
/// readers see either the old or the new state, never a partial write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    open: AtomicBool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            open: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `snapshot` as the initial document, replacing any existing file.
    pub fn initialize(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        self.write_atomically(snapshot)
    }

    fn read(&self) -> Result<StoreSnapshot, StoreError> {
        let file = File::open(&self.path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn write_atomically(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl SnapshotSink for JsonFileStore {
    fn publish(&self, snapshot: StoreSnapshot) -> Result<(), StoreError> {
        self.write_atomically(&snapshot)?;
        tracing::info!(path = %self.path.display(), "store document replaced");
        Ok(())
    }

    fn release(&self) {
        self.open.store(false, Ordering::Release);
    }
}

impl UnitOfWork for JsonFileStore {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError> {
        if self
            .open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StoreError::TransactionInProgress);
        }

        match self.read() {
            Ok(working) => Ok(Box::new(SnapshotTransaction::new(self, working))),
            Err(err) => {
                self.release();
                Err(err)
            }
        }
    }

    fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        self.read()
    }
}
