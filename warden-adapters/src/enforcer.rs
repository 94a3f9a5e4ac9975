//! Per-agent evaluation and DENY enforcement.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use warden_compliance::{PolicyReceipt, ReceiptGenerator};
use warden_policy::{EvaluationRequest, EvaluationResult, Evaluator};
use warden_primitives::Payload;

use crate::error::GovernanceViolation;

/// Evaluates payloads on behalf of one agent and turns DENY into an error.
pub struct Enforcer {
    evaluator: Arc<dyn Evaluator>,
    agent_id: String,
    generator: Option<ReceiptGenerator>,
    force_redaction: bool,
    receipts: Mutex<Vec<PolicyReceipt>>,
}

impl fmt::Debug for Enforcer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enforcer")
            .field("agent_id", &self.agent_id)
            .field("signs_receipts", &self.generator.is_some())
            .field("force_redaction", &self.force_redaction)
            .finish_non_exhaustive()
    }
}

impl Enforcer {
    /// Creates an enforcer for `agent_id` backed by `evaluator`.
    #[must_use]
    pub fn new(evaluator: Arc<dyn Evaluator>, agent_id: impl Into<String>) -> Self {
        Self {
            evaluator,
            agent_id: agent_id.into(),
            generator: None,
            force_redaction: false,
            receipts: Mutex::new(Vec::new()),
        }
    }

    /// Signs a receipt for every evaluated call.
    #[must_use]
    pub fn with_receipts(mut self, generator: ReceiptGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Forces PII auto-redaction for every call made through this enforcer.
    #[must_use]
    pub fn with_forced_redaction(mut self, enabled: bool) -> Self {
        self.force_redaction = enabled;
        self
    }

    /// Returns the agent identifier attached to each request.
    #[must_use]
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Evaluates `payload` for `action` and returns the full result.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceViolation`] when the decision is DENY. The receipt,
    /// if any, is recorded before the error is returned.
    ///
    /// # Panics
    ///
    /// Panics if the internal receipt log lock has been poisoned.
    pub fn check(
        &self,
        action: &str,
        payload: Payload,
        metadata: Option<Payload>,
    ) -> Result<EvaluationResult, GovernanceViolation> {
        let mut request = EvaluationRequest::new(self.agent_id.as_str(), action).with_payload(payload);
        if let Some(metadata) = metadata {
            request = request.with_metadata(metadata);
        }

        let result = if self.force_redaction {
            self.evaluator.evaluate_with_redaction(&request)
        } else {
            self.evaluator.evaluate(&request)
        };

        if let Some(generator) = &self.generator {
            let receipt =
                generator.generate(&result, &request, &self.evaluator.policy_names());
            self.receipts
                .lock()
                .expect("receipt log poisoned")
                .push(receipt);
        }

        if result.decision().is_deny() {
            warn!(
                agent_id = self.agent_id.as_str(),
                action,
                violations = ?result.violations(),
                "governance violation"
            );
            return Err(GovernanceViolation::from_result(&result));
        }

        debug!(action, decision = %result.decision(), "governance check passed");
        Ok(result)
    }

    /// Evaluates `payload` for `action` and returns the payload the caller may
    /// forward: the rewritten one on REDACT, the original on ALLOW.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceViolation`] when the decision is DENY.
    pub fn enforce(
        &self,
        action: &str,
        payload: Payload,
        metadata: Option<Payload>,
    ) -> Result<Payload, GovernanceViolation> {
        let result = self.check(action, payload, metadata)?;
        Ok(result.effective_payload().clone())
    }

    /// Returns a copy of every receipt recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal receipt log lock has been poisoned.
    #[must_use]
    pub fn receipts(&self) -> Vec<PolicyReceipt> {
        self.receipts.lock().expect("receipt log poisoned").clone()
    }

    /// Removes and returns every receipt recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal receipt log lock has been poisoned.
    pub fn take_receipts(&self) -> Vec<PolicyReceipt> {
        std::mem::take(&mut *self.receipts.lock().expect("receipt log poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use warden_pii::PiiRedactor;
    use warden_policy::{Decision, GovernanceEngine, Policy, PolicyRule, RuleAction};

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn engine(auto_redaction: bool) -> Arc<dyn Evaluator> {
        Arc::new(
            GovernanceEngine::builder()
                .policy(
                    Policy::new("block-rm")
                        .unwrap()
                        .with_rule(PolicyRule::contains("input", "rm -rf", RuleAction::Deny).unwrap()),
                )
                .redactor(PiiRedactor::new())
                .auto_redaction(auto_redaction)
                .build(),
        )
    }

    #[test]
    fn allow_returns_original_payload() {
        let enforcer = Enforcer::new(engine(true), "agent");
        let input = payload(json!({"input": "list files"}));
        assert_eq!(enforcer.enforce("tool_start", input.clone(), None).unwrap(), input);
    }

    #[test]
    fn redact_returns_modified_payload() {
        let enforcer = Enforcer::new(engine(true), "agent");
        let out = enforcer
            .enforce("llm_start", payload(json!({"input": "mail bob@example.com"})), None)
            .unwrap();
        assert_eq!(out["input"], json!("mail [REDACTED_EMAIL]"));
    }

    #[test]
    fn deny_becomes_violation() {
        let enforcer = Enforcer::new(engine(true), "agent");
        let err = enforcer
            .enforce("tool_start", payload(json!({"input": "rm -rf /"})), None)
            .unwrap_err();

        assert_eq!(err.decision(), Decision::Deny);
        assert_eq!(err.reason(), "Denied by policy 'block-rm' rule");
        assert_eq!(err.violations(), ["Policy 'block-rm' denied action: input contains"]);
    }

    #[test]
    fn forced_redaction_overrides_engine_setting() {
        let plain = Enforcer::new(engine(false), "agent");
        let input = payload(json!({"input": "call 555-123-4567"}));
        assert_eq!(plain.enforce("a", input.clone(), None).unwrap(), input);

        let forced = Enforcer::new(engine(false), "agent").with_forced_redaction(true);
        let out = forced.enforce("a", input, None).unwrap();
        assert!(out["input"].as_str().unwrap().contains("[REDACTED_PHONE]"));
    }

    #[test]
    fn receipts_are_recorded_for_every_decision() {
        let generator = ReceiptGenerator::new("enforcer-key").unwrap();
        let enforcer = Enforcer::new(engine(true), "agent-9").with_receipts(generator.clone());

        enforcer
            .enforce("tool_start", payload(json!({"input": "ls"})), None)
            .unwrap();
        let _ = enforcer.enforce("tool_start", payload(json!({"input": "rm -rf /"})), None);

        let receipts = enforcer.take_receipts();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].decision, Decision::Allow);
        assert_eq!(receipts[1].decision, Decision::Deny);
        assert_eq!(receipts[1].policy_names, ["block-rm"]);
        assert!(receipts.iter().all(|receipt| generator.verify(receipt)));
        assert!(enforcer.receipts().is_empty());
    }
}
