//! Scoped activation of the acting user.
//!
//! Exactly one actor may be active per [`ActorContext`] at a time. Activation
//! hands back an [`ActorScope`] guard; the actor is released when the guard is
//! dropped, which covers early returns and error propagation alike.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;

use billfix_core::{AuditNote, Ticket};

use crate::actor::Actor;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActorContextError {
    #[error("an actor is already active: {0}")]
    AlreadyActive(String),

    #[error("actor context lock poisoned")]
    Poisoned,
}

/// Holder of the "who is acting" state for one process.
#[derive(Debug, Default)]
pub struct ActorContext {
    active: Mutex<Option<Actor>>,
}

impl ActorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `actor` for the duration of the returned scope.
    pub fn activate(&self, actor: Actor, ticket: Ticket) -> Result<ActorScope<'_>, ActorContextError> {
        let mut slot = self.active.lock().map_err(|_| ActorContextError::Poisoned)?;
        if let Some(existing) = slot.as_ref() {
            return Err(ActorContextError::AlreadyActive(existing.email.clone()));
        }
        *slot = Some(actor.clone());
        drop(slot);

        let span = tracing::info_span!(
            "actor_scope",
            actor = %actor.email,
            ticket = %ticket
        )
        .entered();
        tracing::debug!("actor context activated");

        Ok(ActorScope {
            context: self,
            actor,
            ticket,
            _span: span,
        })
    }

    /// Currently active actor, if any.
    pub fn current(&self) -> Option<Actor> {
        self.active.lock().ok().and_then(|slot| slot.clone())
    }

    fn release(&self) {
        match self.active.lock() {
            Ok(mut slot) => {
                *slot = None;
            }
            Err(poisoned) => {
                *poisoned.into_inner() = None;
            }
        }
    }
}

/// Guard for an active actor. Dropping it deactivates the actor.
#[derive(Debug)]
pub struct ActorScope<'a> {
    context: &'a ActorContext,
    actor: Actor,
    ticket: Ticket,
    _span: tracing::span::EnteredSpan,
}

impl ActorScope<'_> {
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    /// Audit note attributed to the active actor under the run's ticket.
    pub fn note(&self, text: impl Into<String>, at: DateTime<Utc>) -> AuditNote {
        AuditNote::new(
            self.ticket.clone(),
            self.actor.id,
            self.actor.email.clone(),
            text,
            at,
        )
    }
}

impl Drop for ActorScope<'_> {
    fn drop(&mut self) {
        self.context.release();
        tracing::debug!("actor context released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billfix_core::ActorId;

    fn actor() -> Actor {
        Actor::new(ActorId::new(), "ops@example.com")
    }

    fn ticket() -> Ticket {
        Ticket::parse("OPS-1").unwrap()
    }

    #[test]
    fn scope_releases_actor_on_drop() {
        let ctx = ActorContext::new();
        {
            let scope = ctx.activate(actor(), ticket()).unwrap();
            assert_eq!(ctx.current().unwrap().email, "ops@example.com");
            assert_eq!(scope.ticket().as_str(), "OPS-1");
        }
        assert!(ctx.current().is_none());
    }

    #[test]
    fn second_activation_is_rejected_while_active() {
        let ctx = ActorContext::new();
        let _scope = ctx.activate(actor(), ticket()).unwrap();
        let err = ctx.activate(actor(), ticket()).unwrap_err();
        assert_eq!(err, ActorContextError::AlreadyActive("ops@example.com".to_string()));
    }

    #[test]
    fn scope_released_when_error_propagates() {
        fn failing_run(ctx: &ActorContext) -> Result<(), String> {
            let _scope = ctx.activate(actor(), ticket()).map_err(|e| e.to_string())?;
            Err("boom".to_string())
        }

        let ctx = ActorContext::new();
        assert!(failing_run(&ctx).is_err());
        assert!(ctx.current().is_none());
        assert!(ctx.activate(actor(), ticket()).is_ok());
    }

    #[test]
    fn notes_are_attributed_to_the_actor() {
        let ctx = ActorContext::new();
        let who = actor();
        let scope = ctx.activate(who.clone(), ticket()).unwrap();
        let note = scope.note("activity date corrected", Utc::now());
        assert_eq!(note.author, who.id);
        assert_eq!(note.author_email, who.email);
        assert_eq!(note.ticket, ticket());
    }
}
