//! Re-deriving an invoice from its current payments.

use billfix_core::{DomainError, DomainResult};
use billfix_payments::Payment;

use crate::invoice::{Invoice, InvoiceLine, InvoiceStatus};

/// Rebuilds an invoice's contents from the payments it aggregates.
///
/// Implementations return the re-derived invoice; callers must continue with
/// the returned value rather than the one they passed in.
pub trait InvoiceAggregator {
    fn reaggregate(&self, invoice: Invoice, payments: &[Payment]) -> DomainResult<Invoice>;
}

/// Default aggregator: one line per payment, ordered by activity date then id.
///
/// Only `unsubmitted` invoices are recomputed; anything already submitted is
/// frozen from this aggregator's point of view.
#[derive(Debug, Default, Clone, Copy)]
pub struct PaymentLineAggregator;

impl InvoiceAggregator for PaymentLineAggregator {
    fn reaggregate(&self, mut invoice: Invoice, payments: &[Payment]) -> DomainResult<Invoice> {
        if invoice.status() != InvoiceStatus::Unsubmitted {
            return Err(DomainError::invariant(format!(
                "invoice {} is {}; only unsubmitted invoices can be recomputed",
                invoice.invoice_number(),
                invoice.status()
            )));
        }

        for payment in payments {
            let belongs = payment.clinic_detail_study() == invoice.clinic_detail_study()
                && payment.invoice_number() == Some(invoice.invoice_number());
            if !belongs {
                return Err(DomainError::invariant(format!(
                    "payment {} does not belong to invoice {}",
                    payment.id_typed(),
                    invoice.invoice_number()
                )));
            }
        }

        let mut ordered: Vec<&Payment> = payments.iter().collect();
        ordered.sort_by_key(|p| (p.activity_completion_date(), p.id_typed()));

        let lines = ordered
            .into_iter()
            .enumerate()
            .map(|(idx, p)| {
                Ok(InvoiceLine {
                    line_no: line_number(idx)?,
                    payment_id: p.id_typed(),
                    activity_date: p.activity_completion_date(),
                    amount: p.amount(),
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        invoice.replace_lines(lines)?;
        Ok(invoice)
    }
}

/// 1-based line number for the line at `idx`.
fn line_number(idx: usize) -> DomainResult<u32> {
    idx.checked_add(1)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| DomainError::invariant("too many invoice lines"))
}
