//! Append-only audit notes attached to payments and invoices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ActorId, Ticket};

/// One entry in an entity's audit log.
///
/// Notes are never edited or removed; corrections append a new note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditNote {
    pub ticket: Ticket,
    pub author: ActorId,
    pub author_email: String,
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditNote {
    pub fn new(
        ticket: Ticket,
        author: ActorId,
        author_email: impl Into<String>,
        text: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ticket,
            author,
            author_email: author_email.into(),
            text: text.into(),
            recorded_at,
        }
    }
}

impl core::fmt::Display for AuditNote {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            self.ticket,
            self.author_email,
            self.text
        )
    }
}
