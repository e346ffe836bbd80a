//! Invoicing domain module.
//!
//! This crate contains business rules for invoices that aggregate payments,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod invoice;
pub mod reaggregate;

pub use invoice::{Invoice, InvoiceLine, InvoiceStatus};
pub use reaggregate::{InvoiceAggregator, PaymentLineAggregator};
