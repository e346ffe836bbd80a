//! Per-row outcomes and operator notices.

use chrono::NaiveDate;

use billfix_core::Protocol;

use crate::request::CorrectionRequest;

pub const MSG_PAYMENT_NOT_FOUND: &str = "Payment not found.";
pub const MSG_INVOICE_NOT_FOUND: &str = "Invoice not found.";
pub const MSG_DATE_UPDATED: &str = "Activity date updated.";
pub const MSG_NOT_PROCESSED: &str = "Not processed: run aborted.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Success,
    Failed,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Success => "success",
            RecordStatus::Failed => "failed",
        }
    }
}

/// Requested-versus-applied outcome of one input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub protocol: Protocol,
    pub gpid: String,
    pub new_activity_date: NaiveDate,
    pub original_activity_date: Option<NaiveDate>,
    pub status: RecordStatus,
    pub message: String,
}

impl BatchRecord {
    /// Record for a request that has not been decided yet.
    pub(crate) fn for_request(request: &CorrectionRequest) -> Self {
        Self {
            protocol: request.protocol.clone(),
            gpid: request.gpid.clone(),
            new_activity_date: request.new_date,
            original_activity_date: None,
            status: RecordStatus::Failed,
            message: String::new(),
        }
    }

    pub(crate) fn not_processed(request: &CorrectionRequest) -> Self {
        Self::for_request(request).failed(MSG_NOT_PROCESSED)
    }

    pub(crate) fn succeeded(mut self, message: impl Into<String>) -> Self {
        self.status = RecordStatus::Success;
        self.message = message.into();
        self
    }

    pub(crate) fn failed(mut self, message: impl Into<String>) -> Self {
        self.status = RecordStatus::Failed;
        self.message = message.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// A payment's date is about to change (emitted before the write).
    DateChanged,
    InvoiceUpdated,
    PaymentMissing,
    /// The payment points at an invoice that does not exist.
    InvoiceMissing,
    /// The payment is invoiced and the run was not allowed to touch invoices.
    ForceRequired,
    /// Rendering failed after commit; the committed data stands.
    DocumentFailed,
}

/// Human-readable line for the operator. Produced whether or not the run commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl core::fmt::Display for Notice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}
