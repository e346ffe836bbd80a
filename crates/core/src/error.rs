//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures raised by payments, invoices and the identifiers that name them.
///
/// Store and file failures live in the infrastructure crate; lookups that
/// find nothing return `Option` rather than an error here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Operator input that cannot name a payment, protocol, ticket or date.
    #[error("validation failed: {0}")]
    Validation(String),

    /// e.g. reaggregating an invoice that is not unsubmitted.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Stale aggregate version on save.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_their_category() {
        assert_eq!(
            DomainError::invariant("only unsubmitted invoices can be recomputed").to_string(),
            "invariant violated: only unsubmitted invoices can be recomputed"
        );
        assert_eq!(DomainError::conflict("stale").to_string(), "conflict: stale");
    }
}
