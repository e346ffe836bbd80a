//! Run inputs: what to correct and how the run should behave.

use chrono::NaiveDate;

use billfix_core::{DomainError, Protocol, Ticket};
use billfix_infra::TabularRow;

use crate::error::CorrectionError;

pub const COLUMN_GPID: &str = "gpid";
pub const COLUMN_ACTIVITY_DATE: &str = "payment_activity_date";
pub const COLUMN_PROTOCOL: &str = "protocol";

const DATE_FORMATS: [&str; 2] = ["%Y-%b-%d", "%Y-%m-%d"];

/// One requested correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionRequest {
    pub protocol: Protocol,
    /// Full or leading part of the payment id, as quoted on the ticket.
    pub gpid: String,
    pub new_date: NaiveDate,
}

impl CorrectionRequest {
    pub fn new(protocol: Protocol, gpid: impl AsRef<str>, new_date: NaiveDate) -> Result<Self, DomainError> {
        let gpid = gpid.as_ref().trim();
        if gpid.is_empty() {
            return Err(DomainError::validation("gpid must not be empty"));
        }
        Ok(Self {
            protocol,
            gpid: gpid.to_string(),
            new_date,
        })
    }
}

/// Whether the run came from direct input or from a tabular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Single,
    Batch,
}

/// Behaviour switches for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionOptions {
    pub ticket: Ticket,
    /// Allow resubmitting invoices that carry a corrected payment.
    pub force_update: bool,
    /// Persist the run. Without it every write is rolled back at the end.
    pub commit: bool,
    /// Render resubmitted invoices once the run has committed.
    pub generate_document: bool,
}

impl CorrectionOptions {
    /// Dry run, no forced invoice updates, no documents.
    pub fn dry_run(ticket: Ticket) -> Self {
        Self {
            ticket,
            force_update: false,
            commit: false,
            generate_document: false,
        }
    }
}

/// Everything the governor needs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub mode: RunMode,
    /// Email of the user the run is attributed to.
    pub actor_email: String,
    pub requests: Vec<CorrectionRequest>,
    pub options: CorrectionOptions,
}

/// Parse `YYYY-Mon-DD` (`2024-Jan-05`) or ISO `YYYY-MM-DD`.
pub fn parse_activity_date(raw: &str) -> Result<NaiveDate, DomainError> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            DomainError::validation(format!(
                "'{raw}' is not a date (expected YYYY-Mon-DD, e.g. 2024-Jan-05)"
            ))
        })
}

/// Turn tabular rows into requests. Any bad row fails the whole conversion.
pub fn requests_from_rows(rows: &[TabularRow]) -> Result<Vec<CorrectionRequest>, CorrectionError> {
    rows.iter().map(request_from_row).collect()
}

fn request_from_row(row: &TabularRow) -> Result<CorrectionRequest, CorrectionError> {
    let invalid = |message: String| CorrectionError::InvalidInput {
        row: row.row_number,
        message,
    };
    let cell = |column: &str| match row.get(column) {
        Some(value) => Ok(value),
        None if row.has_column(column) => Err(invalid(format!("missing value for column '{column}'"))),
        None => Err(invalid(format!("missing column '{column}'"))),
    };

    let gpid = cell(COLUMN_GPID)?;
    let protocol = Protocol::parse(cell(COLUMN_PROTOCOL)?).map_err(|e| invalid(e.to_string()))?;
    let new_date = parse_activity_date(cell(COLUMN_ACTIVITY_DATE)?).map_err(|e| invalid(e.to_string()))?;

    CorrectionRequest::new(protocol, gpid, new_date).map_err(|e| invalid(e.to_string()))
}
