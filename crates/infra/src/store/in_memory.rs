use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::transaction::{SnapshotSink, SnapshotTransaction};
use super::{StoreError, StoreSnapshot, Transaction, UnitOfWork};

/// In-memory transactional store.
///
/// Intended for tests/dev. Not optimized for performance: every transaction
/// works on a full copy of the state.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreSnapshot>,
    open: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            open: AtomicBool::new(false),
        }
    }
}

impl SnapshotSink for InMemoryStore {
    fn publish(&self, snapshot: StoreSnapshot) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        *state = snapshot;
        Ok(())
    }

    fn release(&self) {
        self.open.store(false, Ordering::Release);
    }
}

impl UnitOfWork for InMemoryStore {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError> {
        if self
            .open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StoreError::TransactionInProgress);
        }

        let working = match self.state.read() {
            Ok(state) => state.clone(),
            Err(_) => {
                self.release();
                return Err(StoreError::Poisoned);
            }
        };

        Ok(Box::new(SnapshotTransaction::new(self, working)))
    }

    fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billfix_core::{ClinicDetailStudyId, PaymentId, Protocol};
    use billfix_payments::{Payment, PaymentStatus};

    fn seeded() -> (InMemoryStore, PaymentId) {
        let id = PaymentId::new();
        let payment = Payment::new(
            id,
            Protocol::parse("P1").unwrap(),
            ClinicDetailStudyId::new(),
            PaymentStatus::Approved,
            500,
        );
        let store = InMemoryStore::with_snapshot(StoreSnapshot {
            payments: vec![payment],
            ..StoreSnapshot::default()
        });
        (store, id)
    }

    #[test]
    fn commit_publishes_working_copy() {
        let (store, id) = seeded();
        let mut tx = store.begin().unwrap();
        let payment = tx.get_payment(id).unwrap().unwrap();
        tx.save_payment(&payment).unwrap();
        tx.commit().unwrap();

        let snap = store.snapshot().unwrap();
        assert_eq!(billfix_core::AggregateRoot::version(&snap.payments[0]), 1);
    }

    #[test]
    fn rollback_and_drop_discard_writes() {
        let (store, id) = seeded();

        let mut tx = store.begin().unwrap();
        let payment = tx.get_payment(id).unwrap().unwrap();
        tx.save_payment(&payment).unwrap();
        tx.rollback();

        {
            let mut tx = store.begin().unwrap();
            let payment = tx.get_payment(id).unwrap().unwrap();
            tx.save_payment(&payment).unwrap();
        }

        let snap = store.snapshot().unwrap();
        assert_eq!(billfix_core::AggregateRoot::version(&snap.payments[0]), 0);
    }

    #[test]
    fn nested_transaction_is_refused() {
        let (store, _) = seeded();
        let tx = store.begin().unwrap();
        assert!(matches!(store.begin(), Err(StoreError::TransactionInProgress)));
        drop(tx);
        assert!(store.begin().is_ok());
    }
}
