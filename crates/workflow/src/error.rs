use thiserror::Error;

use billfix_auth::ActorContextError;
use billfix_core::{DomainError, InvoiceNumber, PaymentId};
use billfix_infra::{DocumentError, StoreError, TabularError};
use billfix_payments::{GuardRejection, PaymentStatus};

/// Failure of a correction run or of one of its steps.
///
/// Only a payment lookup miss is ever recovered per row; every variant that
/// reaches the governor aborts the whole unit of work.
#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("payment {payment_id} cannot be changed: the payment is in the {status} state")]
    GuardViolation {
        payment_id: PaymentId,
        status: PaymentStatus,
    },

    #[error(
        "Payment is invoiced. The invoice number is {invoice_number}. \
         To update both the payment and invoice include --force-update"
    )]
    UnauthorizedInvoiceUpdate {
        payment_id: PaymentId,
        invoice_number: InvoiceNumber,
    },

    /// Intentional abort of a run that was not asked to commit.
    #[error("Dry Run, changes not committed")]
    DryRunAbort,

    #[error("input row {row}: {message}")]
    InvalidInput { row: usize, message: String },

    #[error("no user with email '{0}'")]
    UnknownActor(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Actor(#[from] ActorContextError),

    #[error(transparent)]
    Tabular(#[from] TabularError),
}

impl CorrectionError {
    /// True for the deliberate "nothing was saved" outcome of a dry run.
    pub fn is_dry_run(&self) -> bool {
        matches!(self, CorrectionError::DryRunAbort)
    }

    pub fn invoice_not_found(invoice_number: &InvoiceNumber) -> Self {
        CorrectionError::NotFound {
            entity: "invoice",
            key: invoice_number.to_string(),
        }
    }
}

impl From<GuardRejection> for CorrectionError {
    fn from(value: GuardRejection) -> Self {
        CorrectionError::GuardViolation {
            payment_id: value.payment_id,
            status: value.status,
        }
    }
}
