//! Payment mutator: apply an approved date correction and persist it.

use chrono::NaiveDate;

use billfix_core::{AuditNote, ClinicDetailStudyId, InvoiceNumber};
use billfix_infra::PaymentRepository;
use billfix_payments::{Payment, StatusGuard};

use crate::error::CorrectionError;
use crate::record::{Notice, NoticeKind};

/// What the caller needs after a correction to decide on invoice work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub clinic_detail_study: ClinicDetailStudyId,
    pub invoice_number: Option<InvoiceNumber>,
    pub payment: Payment,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PaymentMutator;

impl PaymentMutator {
    /// Overwrite the payment's activity-completion date, append `note`, save.
    ///
    /// The "date changed" notice is pushed before anything is written, so it
    /// shows up on dry runs too.
    pub fn apply<R>(
        repo: &mut R,
        mut payment: Payment,
        new_date: NaiveDate,
        note: AuditNote,
        notices: &mut Vec<Notice>,
    ) -> Result<Mutation, CorrectionError>
    where
        R: PaymentRepository + ?Sized,
    {
        StatusGuard::check(&payment)?;

        let change = payment.preview_date_change(new_date);
        tracing::info!(
            payment_id = %change.payment_id,
            from = ?change.from,
            to = %change.to,
            "activity completion date change"
        );
        notices.push(Notice::new(NoticeKind::DateChanged, change.to_string()));

        payment.correct_activity_date(new_date, note)?;
        let saved = repo.save_payment(&payment)?;

        Ok(Mutation {
            clinic_detail_study: saved.clinic_detail_study(),
            invoice_number: saved.invoice_number().cloned(),
            payment: saved,
        })
    }
}
