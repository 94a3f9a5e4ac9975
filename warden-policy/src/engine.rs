//! Governance engine: the single decision point for agent actions.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use serde_json::Value;
use tracing::{debug, info};
use warden_pii::{PiiMatch, PiiRedactor};
use warden_primitives::payload::replace_at;

use crate::contracts::{EvaluationRequest, EvaluationResult};
use crate::decision::Decision;
use crate::error::{PolicyError, PolicyResult};
use crate::policy::Policy;
use crate::rule::RuleAction;

/// Literal written over fields addressed by a `redact` rule.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

/// Policy registry plus optional PII redactor.
///
/// Policies are evaluated from highest to lowest priority. Policies sharing a
/// priority run in insertion order, and rules within a policy run in declared
/// order. The registry sits behind a [`RwLock`] so policies may be added or
/// removed while other threads evaluate.
#[derive(Debug)]
pub struct GovernanceEngine {
    policies: RwLock<Vec<Policy>>,
    redactor: Option<PiiRedactor>,
    auto_redaction: AtomicBool,
    running: AtomicBool,
}

impl Default for GovernanceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GovernanceEngine {
    /// Creates an engine with no policies and no redactor.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building an engine.
    #[must_use]
    pub fn builder() -> GovernanceEngineBuilder {
        GovernanceEngineBuilder::default()
    }

    /// Engine with the built-in `pii-protection` policy, a redactor for every
    /// PII category, and auto-redaction enabled.
    #[must_use]
    pub fn with_default_protection() -> Self {
        Self::builder()
            .policy(Policy::default_pii_protection())
            .redactor(PiiRedactor::new())
            .auto_redaction(true)
            .build()
    }

    /// Marks the engine as running.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!(policies = ?self.policy_names(), "governance engine started");
    }

    /// Marks the engine as stopped. Evaluation keeps working.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("governance engine stopped");
    }

    /// Returns true between [`start`](Self::start) and [`stop`](Self::stop).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Registers a policy. A policy with the same name is replaced in place,
    /// keeping its original position among equal-priority policies.
    ///
    /// # Panics
    ///
    /// Panics if the internal policy store lock has been poisoned.
    pub fn add_policy(&self, policy: Policy) {
        info!(name = policy.name(), priority = policy.priority(), "policy added");
        let mut guard = self.policies.write().expect("policy registry poisoned");
        if let Some(slot) = guard.iter_mut().find(|p| p.name() == policy.name()) {
            *slot = policy;
        } else {
            guard.push(policy);
        }
    }

    /// Removes the named policy, returning whether it was registered.
    ///
    /// # Panics
    ///
    /// Panics if the internal policy store lock has been poisoned.
    pub fn remove_policy(&self, name: &str) -> bool {
        let mut guard = self.policies.write().expect("policy registry poisoned");
        let before = guard.len();
        guard.retain(|policy| policy.name() != name);
        let removed = guard.len() != before;
        if removed {
            info!(name, "policy removed");
        }
        removed
    }

    /// Enables or disables the named policy without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotFound`] when no policy has that name.
    ///
    /// # Panics
    ///
    /// Panics if the internal policy store lock has been poisoned.
    pub fn set_policy_enabled(&self, name: &str, enabled: bool) -> PolicyResult<()> {
        let mut guard = self.policies.write().expect("policy registry poisoned");
        let slot = guard
            .iter_mut()
            .find(|policy| policy.name() == name)
            .ok_or_else(|| PolicyError::NotFound(name.to_owned()))?;
        *slot = slot.clone().with_enabled(enabled);
        info!(name, enabled, "policy toggled");
        Ok(())
    }

    /// Returns a copy of the named policy.
    ///
    /// # Panics
    ///
    /// Panics if the internal policy store lock has been poisoned.
    #[must_use]
    pub fn policy(&self, name: &str) -> Option<Policy> {
        let guard = self.policies.read().expect("policy registry poisoned");
        guard.iter().find(|policy| policy.name() == name).cloned()
    }

    /// Names of every registered policy, enabled or not, in evaluation order.
    ///
    /// # Panics
    ///
    /// Panics if the internal policy store lock has been poisoned.
    #[must_use]
    pub fn policy_names(&self) -> Vec<String> {
        let guard = self.policies.read().expect("policy registry poisoned");
        evaluation_order(&guard, false)
            .into_iter()
            .map(|policy| policy.name().to_owned())
            .collect()
    }

    /// Number of registered policies.
    ///
    /// # Panics
    ///
    /// Panics if the internal policy store lock has been poisoned.
    #[must_use]
    pub fn policy_count(&self) -> usize {
        self.policies.read().expect("policy registry poisoned").len()
    }

    /// Returns the attached redactor.
    #[must_use]
    pub fn redactor(&self) -> Option<&PiiRedactor> {
        self.redactor.as_ref()
    }

    /// Turns PII auto-redaction on or off for subsequent evaluations.
    pub fn set_auto_redaction(&self, enabled: bool) {
        self.auto_redaction.store(enabled, Ordering::SeqCst);
    }

    /// Returns whether PII auto-redaction runs by default.
    #[must_use]
    pub fn auto_redaction_enabled(&self) -> bool {
        self.auto_redaction.load(Ordering::SeqCst)
    }

    /// Evaluates `request` against every enabled policy.
    ///
    /// Never fails: a DENY outcome is a result, not an error.
    ///
    /// # Panics
    ///
    /// Panics if the internal policy store lock has been poisoned.
    #[must_use]
    pub fn evaluate(&self, request: &EvaluationRequest) -> EvaluationResult {
        self.evaluate_inner(request, self.auto_redaction_enabled())
    }

    /// Evaluates `request` with PII auto-redaction forced on for this call
    /// only. The engine's own setting is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the internal policy store lock has been poisoned.
    #[must_use]
    pub fn evaluate_with_redaction(&self, request: &EvaluationRequest) -> EvaluationResult {
        self.evaluate_inner(request, true)
    }

    fn evaluate_inner(&self, request: &EvaluationRequest, auto_redact: bool) -> EvaluationResult {
        let original = request.payload();
        let mut working = original.clone();
        let mut decision = Decision::Allow;
        let mut reason = String::from("No policy violations");
        let mut violations = Vec::new();

        {
            let guard = self.policies.read().expect("policy registry poisoned");
            for policy in evaluation_order(&guard, true) {
                for rule in policy.rules() {
                    if !rule.matches(original) {
                        continue;
                    }
                    debug!(
                        policy = policy.name(),
                        field = rule.field(),
                        action = %rule.action(),
                        "policy rule matched"
                    );

                    match rule.action() {
                        RuleAction::Deny => {
                            decision = Decision::Deny;
                            reason = format!("Denied by policy '{}' rule", policy.name());
                            violations.push(format!(
                                "Policy '{}' denied action: {}",
                                policy.name(),
                                rule.describe()
                            ));
                        }
                        RuleAction::Redact => {
                            replace_at(
                                &mut working,
                                rule.field(),
                                Value::String(REDACTED_PLACEHOLDER.to_owned()),
                            );
                            if decision == Decision::Allow {
                                decision = Decision::Redact;
                                reason = format!("Redacted by policy '{}'", policy.name());
                                violations.push(format!(
                                    "Policy '{}' redacted field: {}",
                                    policy.name(),
                                    rule.field()
                                ));
                            }
                        }
                        RuleAction::Allow => {}
                    }
                }
            }
        }

        let mut pii_matches: Vec<PiiMatch> = Vec::new();
        if auto_redact {
            if let Some(redactor) = &self.redactor {
                let (redacted, matches) = redactor.redact_dict(&working);
                if !matches.is_empty() {
                    working = redacted;
                    if decision == Decision::Allow {
                        decision = Decision::Redact;
                        reason = format!(
                            "PII auto-redaction enabled - {} PII items detected",
                            matches.len()
                        );
                    }
                    violations.extend(
                        matches
                            .iter()
                            .map(|found| format!("Auto-redacted PII: {}", found.pii_type)),
                    );
                    pii_matches = matches;
                }
            }
        }

        info!(
            agent_id = request.agent_id(),
            action = request.action(),
            decision = %decision,
            violations = violations.len(),
            pii_matches = pii_matches.len(),
            "request evaluated"
        );

        let result = EvaluationResult::new(decision, reason, original.clone())
            .with_violations(violations)
            .with_pii_matches(pii_matches);
        if decision.is_redact() {
            result.with_modified_payload(working)
        } else {
            result
        }
    }
}

/// Policies sorted by descending priority, ties kept in insertion order.
fn evaluation_order(policies: &[Policy], enabled_only: bool) -> Vec<&Policy> {
    let mut ordered: Vec<&Policy> = policies
        .iter()
        .filter(|policy| !enabled_only || policy.is_enabled())
        .collect();
    ordered.sort_by_key(|policy| Reverse(policy.priority()));
    ordered
}

/// Builder for [`GovernanceEngine`].
#[derive(Debug)]
pub struct GovernanceEngineBuilder {
    policies: Vec<Policy>,
    redactor: Option<PiiRedactor>,
    auto_redaction: bool,
}

impl Default for GovernanceEngineBuilder {
    fn default() -> Self {
        Self {
            policies: Vec::new(),
            redactor: None,
            auto_redaction: true,
        }
    }
}

impl GovernanceEngineBuilder {
    /// Adds a policy.
    #[must_use]
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Adds several policies in order.
    #[must_use]
    pub fn policies<I>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = Policy>,
    {
        self.policies.extend(policies);
        self
    }

    /// Attaches a PII redactor.
    #[must_use]
    pub fn redactor(mut self, redactor: PiiRedactor) -> Self {
        self.redactor = Some(redactor);
        self
    }

    /// Sets whether PII auto-redaction runs without an explicit rule. Defaults to `true`.
    #[must_use]
    pub fn auto_redaction(mut self, enabled: bool) -> Self {
        self.auto_redaction = enabled;
        self
    }

    /// Builds the engine, registering policies through
    /// [`GovernanceEngine::add_policy`] so later duplicates replace earlier ones.
    #[must_use]
    pub fn build(self) -> GovernanceEngine {
        let engine = GovernanceEngine {
            policies: RwLock::new(Vec::with_capacity(self.policies.len())),
            redactor: self.redactor,
            auto_redaction: AtomicBool::new(self.auto_redaction),
            running: AtomicBool::new(false),
        };
        for policy in self.policies {
            engine.add_policy(policy);
        }

        info!(
            policy_count = engine.policy_count(),
            pii_redactor_enabled = engine.redactor.is_some(),
            auto_redaction_enabled = self.auto_redaction,
            "governance engine initialized"
        );
        engine
    }
}
