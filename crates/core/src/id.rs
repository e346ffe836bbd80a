//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a payment (the "gpid" quoted on tickets).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

/// Identifier of a clinic-detail-study (the site/study pairing an invoice belongs to).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClinicDetailStudyId(Uuid);

/// Identifier of a user (actor identity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(PaymentId, "PaymentId");
impl_uuid_newtype!(ClinicDetailStudyId, "ClinicDetailStudyId");
impl_uuid_newtype!(ActorId, "ActorId");

impl PaymentId {
    /// Case-insensitive prefix match against the hyphenated form of the id.
    ///
    /// Tickets usually quote a truncated gpid, so lookups go through this rather
    /// than exact equality.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim().to_ascii_lowercase();
        self.0.hyphenated().to_string().starts_with(&prefix)
    }
}

/// Study protocol code (e.g. `ABC-123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Protocol(String);

/// Invoice number as printed on the invoice document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

/// External ticket reference that justifies a data correction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(String);

macro_rules! impl_code_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Build from raw input, trimming whitespace. Empty values are rejected.
            pub fn parse(raw: impl AsRef<str>) -> Result<Self, DomainError> {
                let trimmed = raw.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation(format!("{} must not be empty", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

impl_code_newtype!(Protocol, "protocol");
impl_code_newtype!(InvoiceNumber, "invoice number");
impl_code_newtype!(Ticket, "ticket");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_ignores_case_and_whitespace() {
        let id = PaymentId::from_str("6f1c2a9e-0d4b-4e55-9a1e-3b7c8d9e0f12").unwrap();
        assert!(id.matches_prefix("6F1C2A9E"));
        assert!(id.matches_prefix(" 6f1c2a9e-0d4b "));
        assert!(!id.matches_prefix("6f1c2a9f"));
    }

    #[test]
    fn code_newtypes_trim_and_reject_empty() {
        assert_eq!(Protocol::parse("  P-100 ").unwrap().as_str(), "P-100");
        assert!(matches!(Ticket::parse("   "), Err(DomainError::Validation(_))));
    }

    #[test]
    fn invalid_uuid_reports_type_name() {
        let err = ClinicDetailStudyId::from_str("nope").unwrap_err();
        match err {
            DomainError::InvalidId(msg) if msg.starts_with("ClinicDetailStudyId") => {}
            other => panic!("unexpected error {other:?}"),
        }
    }
}
