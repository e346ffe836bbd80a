use serde::{Deserialize, Serialize};

use billfix_core::ActorId;

/// A user that corrections are attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Actor {
    pub fn new(id: ActorId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            display_name: None,
        }
    }

    /// Emails are compared case-insensitively (`Ops@Example.com` == `ops@example.com`).
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}
