//! Enforcement of governance decisions at framework boundaries.
//!
//! The engine never fails on a DENY outcome; the types here are where a DENY
//! becomes an error. An [`Enforcer`] evaluates payloads for one agent,
//! optionally signs a receipt for every decision, and hands back the payload
//! the caller may forward. [`GovernedTool`] applies the same checks around an
//! async [`Tool`].

#![warn(missing_docs, clippy::pedantic)]

mod enforcer;
mod error;
mod tool;

pub use enforcer::Enforcer;
pub use error::{AdapterError, AdapterResult, GovernanceViolation};
pub use tool::{GovernedTool, Tool};
