//! Seams through which other components reach the governance engine.

use std::sync::Arc;

use crate::contracts::{EvaluationRequest, EvaluationResult};
use crate::engine::GovernanceEngine;

/// Anything able to reach a governance decision for a request.
///
/// Enforcement layers hold an explicit `Arc<dyn Evaluator>` instead of
/// constructing an engine of their own.
pub trait Evaluator: Send + Sync {
    /// Evaluates the request using the evaluator's own redaction setting.
    fn evaluate(&self, request: &EvaluationRequest) -> EvaluationResult;

    /// Evaluates the request with PII auto-redaction forced on.
    fn evaluate_with_redaction(&self, request: &EvaluationRequest) -> EvaluationResult;

    /// Names of the policies consulted, in evaluation order.
    fn policy_names(&self) -> Vec<String>;
}

impl Evaluator for GovernanceEngine {
    fn evaluate(&self, request: &EvaluationRequest) -> EvaluationResult {
        GovernanceEngine::evaluate(self, request)
    }

    fn evaluate_with_redaction(&self, request: &EvaluationRequest) -> EvaluationResult {
        GovernanceEngine::evaluate_with_redaction(self, request)
    }

    fn policy_names(&self) -> Vec<String> {
        GovernanceEngine::policy_names(self)
    }
}

impl<E> Evaluator for Arc<E>
where
    E: Evaluator + ?Sized,
{
    fn evaluate(&self, request: &EvaluationRequest) -> EvaluationResult {
        (**self).evaluate(request)
    }

    fn evaluate_with_redaction(&self, request: &EvaluationRequest) -> EvaluationResult {
        (**self).evaluate_with_redaction(request)
    }

    fn policy_names(&self) -> Vec<String> {
        (**self).policy_names()
    }
}
