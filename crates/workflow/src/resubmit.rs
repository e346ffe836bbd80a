//! Invoice resubmission: pull a corrected payment into its existing invoice.
//!
//! The re-aggregation collaborator only recomputes unsubmitted invoices, so
//! the invoice is toggled to `unsubmitted`, re-derived, and put back in its
//! original status. Net status is unchanged; lines and totals are refreshed.
//!
//! Documents are not rendered here. The governor renders them for the
//! returned invoices once the run has committed.

use billfix_core::{AuditNote, ClinicDetailStudyId, InvoiceNumber};
use billfix_infra::{InvoiceRepository, PaymentRepository};
use billfix_invoicing::{Invoice, InvoiceAggregator, InvoiceStatus};

use crate::error::CorrectionError;

pub struct InvoiceResubmission<'a, A> {
    aggregator: &'a A,
}

impl<'a, A> InvoiceResubmission<'a, A>
where
    A: InvoiceAggregator,
{
    pub fn new(aggregator: &'a A) -> Self {
        Self { aggregator }
    }

    /// Re-derive the invoice from its payments and save it with `note` appended.
    ///
    /// [`CorrectionError::NotFound`] when no invoice matches
    /// `(invoice_number, clinic_detail_study)`.
    pub fn resubmit<R>(
        &self,
        repo: &mut R,
        clinic_detail_study: ClinicDetailStudyId,
        invoice_number: &InvoiceNumber,
        note: AuditNote,
    ) -> Result<Invoice, CorrectionError>
    where
        R: PaymentRepository + InvoiceRepository + ?Sized,
    {
        let mut invoice = repo
            .find_invoice(invoice_number, clinic_detail_study)?
            .ok_or_else(|| CorrectionError::invoice_not_found(invoice_number))?;

        let original_status = invoice.status();
        invoice.set_status(InvoiceStatus::Unsubmitted);
        let invoice = repo.save_invoice(&invoice)?;

        let payments = repo.payments_for_invoice(clinic_detail_study, invoice_number)?;
        // Continue with the re-derived invoice, not the one handed in.
        let mut invoice = self.aggregator.reaggregate(invoice, &payments)?;
        invoice.set_status(original_status);
        invoice.add_note(note);
        let invoice = repo.save_invoice(&invoice)?;

        tracing::info!(
            invoice_number = %invoice_number,
            status = %invoice.status(),
            total_amount = invoice.total_amount(),
            lines = invoice.lines().len(),
            "invoice {} updated",
            invoice_number
        );

        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use billfix_core::{ActorId, AggregateRoot, PaymentId, Protocol, Ticket};
    use billfix_infra::{InMemoryStore, StoreSnapshot, UnitOfWork};
    use billfix_invoicing::PaymentLineAggregator;
    use billfix_payments::{Payment, PaymentStatus};
    use chrono::{NaiveDate, Utc};

    fn note() -> AuditNote {
        AuditNote::new(Ticket::parse("OPS-2").unwrap(), ActorId::new(), "ops@example.com", "resubmitted", Utc::now())
    }

    fn fixture(status: InvoiceStatus) -> (InMemoryStore, ClinicDetailStudyId, InvoiceNumber) {
        let cds = ClinicDetailStudyId::new();
        let number = InvoiceNumber::parse("INV-10").unwrap();
        let payments = [(3, 400), (1, 600)]
            .into_iter()
            .map(|(day, amount)| {
                Payment::new(PaymentId::new(), Protocol::parse("P1").unwrap(), cds, PaymentStatus::Invoiced, amount)
                    .with_activity_date(NaiveDate::from_ymd_opt(2024, 2, day).unwrap())
                    .with_invoice(number.clone())
            })
            .collect();
        let store = InMemoryStore::with_snapshot(StoreSnapshot {
            payments,
            invoices: vec![Invoice::new(number.clone(), cds, status)],
            ..StoreSnapshot::default()
        });
        (store, cds, number)
    }

    #[test]
    fn status_is_restored_and_contents_refreshed() {
        let (store, cds, number) = fixture(InvoiceStatus::Submitted);
        let workflow = InvoiceResubmission::new(&PaymentLineAggregator);
        let mut tx = store.begin().unwrap();

        let invoice = workflow.resubmit(&mut *tx, cds, &number, note()).unwrap();

        assert_eq!(invoice.status(), InvoiceStatus::Submitted);
        assert_eq!(invoice.total_amount(), 1_000);
        assert_eq!(invoice.lines().len(), 2);
        assert_eq!(invoice.lines()[0].amount, 600);
        assert_eq!(invoice.notes().len(), 1);
        assert_eq!(invoice.version(), 2);

        let persisted = tx.find_invoice(&number, cds).unwrap().unwrap();
        assert_eq!(persisted, invoice);
    }

    #[test]
    fn approved_invoice_keeps_its_status() {
        let (store, cds, number) = fixture(InvoiceStatus::Approved);
        let workflow = InvoiceResubmission::new(&PaymentLineAggregator);
        let mut tx = store.begin().unwrap();

        let invoice = workflow.resubmit(&mut *tx, cds, &number, note()).unwrap();

        assert_eq!(invoice.status(), InvoiceStatus::Approved);
    }

    #[test]
    fn missing_invoice_is_not_found() {
        let (store, _, number) = fixture(InvoiceStatus::Submitted);
        let workflow = InvoiceResubmission::new(&PaymentLineAggregator);
        let mut tx = store.begin().unwrap();

        let err = workflow
            .resubmit(&mut *tx, ClinicDetailStudyId::new(), &number, note())
            .unwrap_err();

        assert!(matches!(err, CorrectionError::NotFound { entity: "invoice", .. }));
    }
}
