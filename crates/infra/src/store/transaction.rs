use billfix_auth::Actor;
use billfix_core::{ClinicDetailStudyId, InvoiceNumber, PaymentId, Protocol};
use billfix_invoicing::Invoice;
use billfix_payments::Payment;

use super::{
    ActorDirectory, InvoiceRepository, PaymentRepository, StoreError, StoreSnapshot, Transaction,
};

/// Backend hooks for a snapshot-based transaction.
pub(crate) trait SnapshotSink {
    /// Make `snapshot` the committed state.
    fn publish(&self, snapshot: StoreSnapshot) -> Result<(), StoreError>;

    /// Called exactly once when the transaction ends, committed or not.
    fn release(&self);
}

/// Transaction over a private working copy of the store.
///
/// Writes only touch the working copy; commit hands it to the backend, and
/// anything else (explicit rollback, drop, panic unwinding) throws it away.
pub(crate) struct SnapshotTransaction<'a> {
    sink: &'a dyn SnapshotSink,
    working: StoreSnapshot,
    committed: bool,
}

impl<'a> SnapshotTransaction<'a> {
    pub(crate) fn new(sink: &'a dyn SnapshotSink, working: StoreSnapshot) -> Self {
        Self {
            sink,
            working,
            committed: false,
        }
    }
}

impl PaymentRepository for SnapshotTransaction<'_> {
    fn find_payment(&self, protocol: &Protocol, id_prefix: &str) -> Result<Option<Payment>, StoreError> {
        self.working.find_payment(protocol, id_prefix)
    }

    fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        Ok(self.working.get_payment(id))
    }

    fn payments_for_invoice(
        &self,
        clinic_detail_study: ClinicDetailStudyId,
        invoice_number: &InvoiceNumber,
    ) -> Result<Vec<Payment>, StoreError> {
        Ok(self.working.payments_for_invoice(clinic_detail_study, invoice_number))
    }

    fn save_payment(&mut self, payment: &Payment) -> Result<Payment, StoreError> {
        self.working.save_payment(payment)
    }
}

impl InvoiceRepository for SnapshotTransaction<'_> {
    fn find_invoice(
        &self,
        invoice_number: &InvoiceNumber,
        clinic_detail_study: ClinicDetailStudyId,
    ) -> Result<Option<Invoice>, StoreError> {
        Ok(self.working.find_invoice(invoice_number, clinic_detail_study))
    }

    fn save_invoice(&mut self, invoice: &Invoice) -> Result<Invoice, StoreError> {
        self.working.save_invoice(invoice)
    }
}

impl ActorDirectory for SnapshotTransaction<'_> {
    fn find_actor_by_email(&self, email: &str) -> Result<Option<Actor>, StoreError> {
        Ok(self.working.find_actor_by_email(email))
    }
}

impl Transaction for SnapshotTransaction<'_> {
    fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        let working = std::mem::take(&mut self.working);
        self.sink.publish(working)?;
        self.committed = true;
        tracing::debug!("transaction committed");
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        // Drop does the work.
    }
}

impl Drop for SnapshotTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!("transaction rolled back");
        }
        self.sink.release();
    }
}
