use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use billfix_core::{AggregateRoot, AuditNote, ClinicDetailStudyId, DomainError, InvoiceNumber, PaymentId};

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Unsubmitted,
    Submitted,
    Approved,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Unsubmitted,
        InvoiceStatus::Submitted,
        InvoiceStatus::Approved,
        InvoiceStatus::Paid,
        InvoiceStatus::Void,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Unsubmitted => "unsubmitted",
            InvoiceStatus::Submitted => "submitted",
            InvoiceStatus::Approved => "approved",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| DomainError::validation(format!("unknown invoice status '{s}'")))
    }
}

/// Invoice line derived from one payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_no: u32,
    pub payment_id: PaymentId,
    pub activity_date: Option<NaiveDate>,
    /// Amount in smallest currency unit (e.g., cents).
    pub amount: u64,
}

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    invoice_number: InvoiceNumber,
    clinic_detail_study: ClinicDetailStudyId,
    status: InvoiceStatus,
    #[serde(default)]
    lines: Vec<InvoiceLine>,
    #[serde(default)]
    total_amount: u64,
    #[serde(default)]
    notes: Vec<AuditNote>,
    #[serde(default)]
    version: u64,
}

impl Invoice {
    pub fn new(
        invoice_number: InvoiceNumber,
        clinic_detail_study: ClinicDetailStudyId,
        status: InvoiceStatus,
    ) -> Self {
        Self {
            invoice_number,
            clinic_detail_study,
            status,
            lines: Vec::new(),
            total_amount: 0,
            notes: Vec::new(),
            version: 0,
        }
    }

    pub fn invoice_number(&self) -> &InvoiceNumber {
        &self.invoice_number
    }

    pub fn clinic_detail_study(&self) -> ClinicDetailStudyId {
        self.clinic_detail_study
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn notes(&self) -> &[AuditNote] {
        &self.notes
    }

    pub fn set_status(&mut self, status: InvoiceStatus) {
        self.status = status;
    }

    pub fn add_note(&mut self, note: AuditNote) {
        self.notes.push(note);
    }

    /// Record the version assigned by the store after an accepted save.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Replace all lines and recompute the total.
    pub fn replace_lines(&mut self, lines: Vec<InvoiceLine>) -> Result<(), DomainError> {
        let mut total: u64 = 0;
        for line in &lines {
            total = total
                .checked_add(line.amount)
                .ok_or_else(|| DomainError::invariant("invoice total overflow"))?;
        }
        self.lines = lines;
        self.total_amount = total;
        Ok(())
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceNumber;

    fn id(&self) -> &Self::Id {
        &self.invoice_number
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_invoice() -> Invoice {
        Invoice::new(
            InvoiceNumber::parse("INV-1").unwrap(),
            ClinicDetailStudyId::new(),
            InvoiceStatus::Submitted,
        )
    }

    fn line(no: u32, amount: u64) -> InvoiceLine {
        InvoiceLine {
            line_no: no,
            payment_id: PaymentId::new(),
            activity_date: None,
            amount,
        }
    }

    #[test]
    fn replace_lines_recomputes_total() {
        let mut invoice = test_invoice();
        invoice.replace_lines(vec![line(1, 100), line(2, 250)]).unwrap();
        assert_eq!(invoice.total_amount(), 350);

        invoice.replace_lines(vec![line(1, 40)]).unwrap();
        assert_eq!(invoice.total_amount(), 40);
        assert_eq!(invoice.lines().len(), 1);
    }

    #[test]
    fn overflowing_total_is_rejected_without_partial_update() {
        let mut invoice = test_invoice();
        invoice.replace_lines(vec![line(1, 10)]).unwrap();

        let err = invoice
            .replace_lines(vec![line(1, u64::MAX), line(2, 1)])
            .unwrap_err();

        assert_eq!(err, DomainError::invariant("invoice total overflow"));
        assert_eq!(invoice.total_amount(), 10);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in InvoiceStatus::ALL {
            assert_eq!(status.as_str().parse::<InvoiceStatus>().unwrap(), status);
        }
    }
}
