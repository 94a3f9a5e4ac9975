//! Errors raised at enforcement boundaries.

use thiserror::Error;
use warden_policy::{Decision, EvaluationResult};

/// Raised when a governance decision blocks an action.
///
/// Renders as `"{reason}: {v1}, {v2}"`, or just the reason when there are no
/// violation messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.reason, .violations))]
pub struct GovernanceViolation {
    reason: String,
    decision: Decision,
    violations: Vec<String>,
}

impl GovernanceViolation {
    /// Creates a violation from its parts.
    #[must_use]
    pub fn new(reason: impl Into<String>, decision: Decision, violations: Vec<String>) -> Self {
        Self {
            reason: reason.into(),
            decision,
            violations,
        }
    }

    /// Creates a violation describing `result`.
    #[must_use]
    pub fn from_result(result: &EvaluationResult) -> Self {
        Self::new(
            result.reason(),
            result.decision(),
            result.violations().to_vec(),
        )
    }

    /// Returns the engine's reason for the decision.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the blocking decision.
    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Returns the individual violation messages.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}

fn render(reason: &str, violations: &[String]) -> String {
    if violations.is_empty() {
        reason.to_owned()
    } else {
        format!("{reason}: {}", violations.join(", "))
    }
}

/// Errors surfaced by governed tools.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Governance blocked the call.
    #[error(transparent)]
    Violation(#[from] GovernanceViolation),
    /// The wrapped tool failed.
    #[error("tool `{tool}` failed: {reason}")]
    Tool {
        /// Name of the failing tool.
        tool: String,
        /// Human-readable explanation.
        reason: String,
    },
}

impl AdapterError {
    /// Convenience constructor for tool failures.
    #[must_use]
    pub fn tool(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used by adapters.
pub type AdapterResult<T> = Result<T, AdapterError>;
