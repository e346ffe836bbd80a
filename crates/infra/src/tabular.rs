//! Tabular input: rows of named cells read from a delimited file.
//!
//! Spreadsheet conversion happens upstream; this module only reads the CSV
//! export.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },
}

/// One data row keyed by normalised (trimmed, lowercased) header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularRow {
    /// 1-based position among the data rows (header excluded).
    pub row_number: usize,
    cells: BTreeMap<String, String>,
}

impl TabularRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            cells: BTreeMap::new(),
        }
    }

    pub fn with_cell(mut self, column: &str, value: impl Into<String>) -> Self {
        self.cells.insert(normalise_header(column), value.into());
        self
    }

    /// Trimmed cell value; `None` when the column is absent or the cell is blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(&normalise_header(column))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(&normalise_header(column))
    }
}

pub trait TabularSource {
    fn rows(&self) -> Result<Vec<TabularRow>, TabularError>;
}

/// CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvTabularSource {
    path: PathBuf,
}

impl CsvTabularSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_err(&self, source: csv::Error) -> TabularError {
        TabularError::Read {
            path: self.path.clone(),
            source,
        }
    }
}

impl TabularSource for CsvTabularSource {
    fn rows(&self) -> Result<Vec<TabularRow>, TabularError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| self.read_err(e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| self.read_err(e))?
            .iter()
            .map(normalise_header)
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(TabularError::MissingHeader {
                path: self.path.clone(),
            });
        }

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| self.read_err(e))?;
            let mut row = TabularRow::new(idx + 1);
            for (header, value) in headers.iter().zip(record.iter()) {
                if !header.is_empty() {
                    row.cells.insert(header.clone(), value.to_string());
                }
            }
            rows.push(row);
        }

        tracing::debug!(path = %self.path.display(), rows = rows.len(), "tabular source read");
        Ok(rows)
    }
}

fn normalise_header(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_rows_keyed_by_normalised_header() {
        let file = csv_file(
            " GPID ,payment_activity_date,Protocol\n6f1c,2024-Jan-05,P1\nabcd, 2024-Feb-10 ,P2\n",
        );
        let rows = CsvTabularSource::new(file.path()).rows().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 1);
        assert_eq!(rows[0].get("gpid"), Some("6f1c"));
        assert_eq!(rows[1].get("payment_activity_date"), Some("2024-Feb-10"));
        assert_eq!(rows[1].get("protocol"), Some("P2"));
    }

    #[test]
    fn short_rows_leave_missing_cells_absent() {
        let file = csv_file("gpid,payment_activity_date,protocol\n6f1c,2024-Jan-05\n");
        let rows = CsvTabularSource::new(file.path()).rows().unwrap();
        assert_eq!(rows[0].get("protocol"), None);
        assert!(!rows[0].has_column("protocol"));
    }

    #[test]
    fn blank_cells_read_as_none() {
        let row = TabularRow::new(1).with_cell("gpid", "   ");
        assert!(row.has_column("gpid"));
        assert_eq!(row.get("GPID"), None);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = CsvTabularSource::new("/nonexistent/rows.csv").rows().unwrap_err();
        assert!(matches!(err, TabularError::Read { .. }));
    }
}
