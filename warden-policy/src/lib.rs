//! Governance policy evaluation for agents.
//!
//! A [`GovernanceEngine`] holds a registry of named, prioritised [`Policy`]
//! values and an optional [`PiiRedactor`](warden_pii::PiiRedactor). Each call
//! to [`GovernanceEngine::evaluate`] walks the enabled policies from highest to
//! lowest priority, applies every matching rule to a private copy of the
//! payload, and returns an [`EvaluationResult`] whose decision follows
//! `Deny > Redact > Allow`.

#![warn(missing_docs, clippy::pedantic)]

pub mod contracts;
pub mod decision;
pub mod engine;
pub mod error;
pub mod integrations;
pub mod loader;
pub mod policy;
pub mod rule;

pub use contracts::{EvaluationRequest, EvaluationResult};
pub use decision::Decision;
pub use engine::{GovernanceEngine, GovernanceEngineBuilder, REDACTED_PLACEHOLDER};
pub use error::{PolicyError, PolicyResult};
pub use integrations::Evaluator;
pub use loader::PolicyLoader;
pub use policy::Policy;
pub use rule::{Operator, PolicyRule, RuleAction};
