//! Transactional repository boundary for payments, invoices and actors.
//!
//! The workflow only ever talks to a [`Transaction`]: every read and write of a
//! run goes through one unit of work that is either committed as a whole or
//! discarded as a whole. Implementations provided here:
//!
//! - [`InMemoryStore`]: tests/dev
//! - [`JsonFileStore`]: a single JSON document on disk, replaced atomically on commit

pub mod in_memory;
pub mod json_file;
pub mod snapshot;
mod transaction;

pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
pub use snapshot::StoreSnapshot;

use thiserror::Error;

use billfix_auth::Actor;
use billfix_core::{ClinicDetailStudyId, InvoiceNumber, PaymentId, Protocol};
use billfix_invoicing::Invoice;
use billfix_payments::Payment;

/// Store operation error.
///
/// These are **infrastructure errors** (storage, concurrency, lookup ambiguity)
/// as opposed to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("lookup matched more than one record: {0}")]
    AmbiguousMatch(String),

    #[error("record does not exist: {0}")]
    Missing(String),

    #[error("a transaction is already open on this store")]
    TransactionInProgress,

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is not valid: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait PaymentRepository {
    /// Payment in `protocol` whose id starts with `id_prefix` (case-insensitive).
    ///
    /// `Ok(None)` when nothing matches; [`StoreError::AmbiguousMatch`] when the
    /// prefix is shared by several payments.
    fn find_payment(&self, protocol: &Protocol, id_prefix: &str) -> Result<Option<Payment>, StoreError>;

    fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError>;

    /// All payments carried by an invoice, in store order.
    fn payments_for_invoice(
        &self,
        clinic_detail_study: ClinicDetailStudyId,
        invoice_number: &InvoiceNumber,
    ) -> Result<Vec<Payment>, StoreError>;

    /// Persist an existing payment. Returns the saved state with its new version.
    fn save_payment(&mut self, payment: &Payment) -> Result<Payment, StoreError>;
}

pub trait InvoiceRepository {
    fn find_invoice(
        &self,
        invoice_number: &InvoiceNumber,
        clinic_detail_study: ClinicDetailStudyId,
    ) -> Result<Option<Invoice>, StoreError>;

    /// Persist an existing invoice. Returns the saved state with its new version.
    fn save_invoice(&mut self, invoice: &Invoice) -> Result<Invoice, StoreError>;
}

pub trait ActorDirectory {
    fn find_actor_by_email(&self, email: &str) -> Result<Option<Actor>, StoreError>;
}

/// One open unit of work.
///
/// Dropping a transaction without calling [`Transaction::commit`] discards it.
pub trait Transaction: PaymentRepository + InvoiceRepository + ActorDirectory {
    fn commit(self: Box<Self>) -> Result<(), StoreError>;

    fn rollback(self: Box<Self>);
}

/// Source of transactions. At most one transaction may be open at a time.
pub trait UnitOfWork {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError>;

    /// Copy of the committed state.
    fn snapshot(&self) -> Result<StoreSnapshot, StoreError>;
}

impl<S> UnitOfWork for std::sync::Arc<S>
where
    S: UnitOfWork + ?Sized,
{
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError> {
        (**self).begin()
    }

    fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        (**self).snapshot()
    }
}
