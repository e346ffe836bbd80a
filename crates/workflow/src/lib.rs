//! `billfix-workflow`: activity-date correction runs.
//!
//! A run takes correction requests (one from the command line, or many from a
//! tabular export), applies them inside a single transaction, resubmits
//! affected invoices when allowed to, and then either commits or discards
//! everything. Receipts are written outside the transaction.
//!
//! ```text
//! requests ─▶ Governor (begin tx, activate actor)
//!               └▶ Orchestrator, per row:
//!                    lookup ─▶ StatusGuard ─▶ PaymentMutator ─▶ InvoiceResubmission?
//!             Governor (commit | forced rollback) ─▶ documents (committed only)
//!             ─▶ ReceiptReporter
//! ```

pub mod error;
pub mod governor;
pub mod mutator;
pub mod orchestrator;
pub mod receipt;
pub mod record;
pub mod request;
pub mod resubmit;

pub use error::CorrectionError;
pub use governor::{Governor, RunFailure, RunReport};
pub use mutator::{Mutation, PaymentMutator};
pub use orchestrator::{BatchAborted, BatchOutcome, Orchestrator};
pub use receipt::{ReceiptError, ReceiptReporter};
pub use record::{BatchRecord, Notice, NoticeKind, RecordStatus};
pub use request::{
    CorrectionOptions, CorrectionRequest, RunMode, RunRequest, parse_activity_date,
    requests_from_rows,
};
pub use resubmit::InvoiceResubmission;
