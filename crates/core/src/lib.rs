//! `billfix-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod note;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{ActorId, ClinicDetailStudyId, InvoiceNumber, PaymentId, Protocol, Ticket};
pub use note::AuditNote;
