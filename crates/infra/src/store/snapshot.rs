//! Serializable image of the whole store and the lookups shared by all backends.

use serde::{Deserialize, Serialize};

use billfix_auth::Actor;
use billfix_core::{AggregateRoot, ClinicDetailStudyId, ExpectedVersion, InvoiceNumber, PaymentId, Protocol};
use billfix_invoicing::Invoice;
use billfix_payments::Payment;

use super::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
}

impl StoreSnapshot {
    pub fn find_payment(&self, protocol: &Protocol, id_prefix: &str) -> Result<Option<Payment>, StoreError> {
        let mut matches = self
            .payments
            .iter()
            .filter(|p| p.protocol() == protocol && p.id_typed().matches_prefix(id_prefix));

        let first = matches.next();
        if first.is_some() && matches.next().is_some() {
            return Err(StoreError::AmbiguousMatch(format!(
                "payment prefix '{id_prefix}' in protocol {protocol}"
            )));
        }
        Ok(first.cloned())
    }

    pub fn get_payment(&self, id: PaymentId) -> Option<Payment> {
        self.payments.iter().find(|p| p.id_typed() == id).cloned()
    }

    pub fn payments_for_invoice(
        &self,
        clinic_detail_study: ClinicDetailStudyId,
        invoice_number: &InvoiceNumber,
    ) -> Vec<Payment> {
        self.payments
            .iter()
            .filter(|p| {
                p.clinic_detail_study() == clinic_detail_study
                    && p.invoice_number() == Some(invoice_number)
            })
            .cloned()
            .collect()
    }

    pub fn find_invoice(
        &self,
        invoice_number: &InvoiceNumber,
        clinic_detail_study: ClinicDetailStudyId,
    ) -> Option<Invoice> {
        self.invoices
            .iter()
            .find(|i| i.invoice_number() == invoice_number && i.clinic_detail_study() == clinic_detail_study)
            .cloned()
    }

    pub fn find_actor_by_email(&self, email: &str) -> Option<Actor> {
        self.actors.iter().find(|a| a.has_email(email)).cloned()
    }

    pub fn save_payment(&mut self, payment: &Payment) -> Result<Payment, StoreError> {
        let slot = self
            .payments
            .iter_mut()
            .find(|p| p.id_typed() == payment.id_typed())
            .ok_or_else(|| StoreError::Missing(format!("payment {}", payment.id_typed())))?;

        ExpectedVersion::Exact(payment.version())
            .check(slot.version())
            .map_err(|e| StoreError::Conflict(format!("payment {}: {e}", payment.id_typed())))?;

        let mut saved = payment.clone();
        saved.set_version(slot.version() + 1);
        *slot = saved.clone();
        Ok(saved)
    }

    pub fn save_invoice(&mut self, invoice: &Invoice) -> Result<Invoice, StoreError> {
        let slot = self
            .invoices
            .iter_mut()
            .find(|i| {
                i.invoice_number() == invoice.invoice_number()
                    && i.clinic_detail_study() == invoice.clinic_detail_study()
            })
            .ok_or_else(|| StoreError::Missing(format!("invoice {}", invoice.invoice_number())))?;

        ExpectedVersion::Exact(invoice.version())
            .check(slot.version())
            .map_err(|e| StoreError::Conflict(format!("invoice {}: {e}", invoice.invoice_number())))?;

        let mut saved = invoice.clone();
        saved.set_version(slot.version() + 1);
        *slot = saved.clone();
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billfix_core::ActorId;
    use billfix_invoicing::InvoiceStatus;
    use billfix_payments::PaymentStatus;
    use core::str::FromStr;

    fn payment(id: &str, protocol: &str) -> Payment {
        Payment::new(
            PaymentId::from_str(id).unwrap(),
            Protocol::parse(protocol).unwrap(),
            ClinicDetailStudyId::new(),
            PaymentStatus::Approved,
            100,
        )
    }

    fn snapshot() -> StoreSnapshot {
        StoreSnapshot {
            actors: vec![Actor::new(ActorId::new(), "ops@example.com")],
            payments: vec![
                payment("aaaa1111-0000-4000-8000-000000000001", "P1"),
                payment("aaaa2222-0000-4000-8000-000000000002", "P1"),
                payment("bbbb1111-0000-4000-8000-000000000003", "P2"),
            ],
            invoices: vec![],
        }
    }

    #[test]
    fn prefix_lookup_is_scoped_to_protocol() {
        let snap = snapshot();
        let p = Protocol::parse("P1").unwrap();
        assert!(snap.find_payment(&p, "AAAA1111").unwrap().is_some());
        assert!(snap.find_payment(&p, "bbbb1111").unwrap().is_none());
    }

    #[test]
    fn shared_prefix_is_ambiguous() {
        let snap = snapshot();
        let err = snap.find_payment(&Protocol::parse("P1").unwrap(), "aaaa").unwrap_err();
        assert!(matches!(err, StoreError::AmbiguousMatch(_)));
    }

    #[test]
    fn save_bumps_version_and_rejects_stale_copies() {
        let mut snap = snapshot();
        let original = snap.payments[0].clone();

        let saved = snap.save_payment(&original).unwrap();
        assert_eq!(saved.version(), 1);

        let err = snap.save_payment(&original).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn saving_unknown_invoice_is_missing() {
        let mut snap = snapshot();
        let invoice = Invoice::new(
            InvoiceNumber::parse("INV-404").unwrap(),
            ClinicDetailStudyId::new(),
            InvoiceStatus::Submitted,
        );
        assert!(matches!(snap.save_invoice(&invoice), Err(StoreError::Missing(_))));
    }

    #[test]
    fn actor_lookup_ignores_email_case() {
        let snap = snapshot();
        assert!(snap.find_actor_by_email("OPS@example.COM").is_some());
    }
}
