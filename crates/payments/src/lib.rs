//! Payments domain module.
//!
//! Business rules for billable payments: the status lifecycle, the guard that
//! protects released/credited payments, and the in-memory date correction.
//! No IO, no storage.

pub mod guard;
pub mod payment;

pub use guard::{GuardRejection, StatusGuard, TERMINAL_STATUSES};
pub use payment::{DateChange, Payment, PaymentStatus};
