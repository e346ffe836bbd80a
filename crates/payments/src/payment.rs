use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use billfix_core::{
    AggregateRoot, AuditNote, ClinicDetailStudyId, DomainError, InvoiceNumber, PaymentId,
    Protocol,
};

use crate::guard::{GuardRejection, StatusGuard};

/// Payment status lifecycle.
///
/// `Released` and `Credited` are terminal: money has left (or been returned)
/// and the payment's dates are part of the financial record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Held,
    Invoiced,
    Released,
    Credited,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 6] = [
        PaymentStatus::Pending,
        PaymentStatus::Approved,
        PaymentStatus::Held,
        PaymentStatus::Invoiced,
        PaymentStatus::Released,
        PaymentStatus::Credited,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Held => "held",
            PaymentStatus::Invoiced => "invoiced",
            PaymentStatus::Released => "released",
            PaymentStatus::Credited => "credited",
        }
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| DomainError::validation(format!("unknown payment status '{s}'")))
    }
}

/// Outcome of a date correction: what the date was and what it became.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateChange {
    pub payment_id: PaymentId,
    pub from: Option<NaiveDate>,
    pub to: NaiveDate,
}

impl core::fmt::Display for DateChange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let from = self
            .from
            .map(|d| d.to_string())
            .unwrap_or_else(|| "(none)".to_string());
        write!(
            f,
            "payment updated {}, activity completion date from {} => {}",
            self.payment_id, from, self.to
        )
    }
}

/// Aggregate root: Payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    protocol: Protocol,
    clinic_detail_study: ClinicDetailStudyId,
    status: PaymentStatus,
    activity_completion_date: Option<NaiveDate>,
    invoice_number: Option<InvoiceNumber>,
    /// Amount in smallest currency unit (e.g., cents).
    amount: u64,
    #[serde(default)]
    notes: Vec<AuditNote>,
    #[serde(default)]
    version: u64,
}

impl Payment {
    pub fn new(
        id: PaymentId,
        protocol: Protocol,
        clinic_detail_study: ClinicDetailStudyId,
        status: PaymentStatus,
        amount: u64,
    ) -> Self {
        Self {
            id,
            protocol,
            clinic_detail_study,
            status,
            activity_completion_date: None,
            invoice_number: None,
            amount,
            notes: Vec::new(),
            version: 0,
        }
    }

    pub fn with_activity_date(mut self, date: NaiveDate) -> Self {
        self.activity_completion_date = Some(date);
        self
    }

    pub fn with_invoice(mut self, invoice_number: InvoiceNumber) -> Self {
        self.invoice_number = Some(invoice_number);
        self
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn clinic_detail_study(&self) -> ClinicDetailStudyId {
        self.clinic_detail_study
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn activity_completion_date(&self) -> Option<NaiveDate> {
        self.activity_completion_date
    }

    pub fn invoice_number(&self) -> Option<&InvoiceNumber> {
        self.invoice_number.as_ref()
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn notes(&self) -> &[AuditNote] {
        &self.notes
    }

    /// Record the version assigned by the store after an accepted save.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Describe the correction without applying it.
    pub fn preview_date_change(&self, new_date: NaiveDate) -> DateChange {
        DateChange {
            payment_id: self.id,
            from: self.activity_completion_date,
            to: new_date,
        }
    }

    /// Overwrite the activity-completion date and append `note`.
    ///
    /// Invariant: terminal payments (released/credited) are never touched; the
    /// guard is re-evaluated here even if the caller already checked it.
    pub fn correct_activity_date(
        &mut self,
        new_date: NaiveDate,
        note: AuditNote,
    ) -> Result<DateChange, GuardRejection> {
        StatusGuard::check(self)?;
        let change = self.preview_date_change(new_date);
        self.activity_completion_date = Some(new_date);
        self.notes.push(note);
        Ok(change)
    }
}

impl AggregateRoot for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
