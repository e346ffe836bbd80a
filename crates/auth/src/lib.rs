//! `billfix-auth`: who is acting during a correction run.
//!
//! This crate is intentionally decoupled from storage; actors are resolved by
//! the caller and handed to [`ActorContext::activate`].

pub mod actor;
pub mod context;

pub use actor::Actor;
pub use context::{ActorContext, ActorContextError, ActorScope};
