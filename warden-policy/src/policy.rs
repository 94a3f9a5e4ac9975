//! Named, prioritised collections of rules.

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};
use crate::rule::{PolicyRule, RuleAction};

/// Name of the built-in PII protection policy.
pub const PII_PROTECTION: &str = "pii-protection";

#[derive(Debug, Deserialize)]
struct PolicySpec {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    rules: Vec<PolicyRule>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    priority: i64,
}

fn default_enabled() -> bool {
    true
}

/// Governance policy: an ordered list of rules with a unique name.
///
/// Higher priorities are evaluated first. Disabled policies are kept in the
/// registry but take no part in evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicySpec")]
pub struct Policy {
    name: String,
    description: String,
    rules: Vec<PolicyRule>,
    enabled: bool,
    priority: i64,
}

impl Policy {
    /// Creates an enabled, empty policy with priority 0.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPolicy`] when the name is empty.
    pub fn new(name: impl Into<String>) -> PolicyResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PolicyError::InvalidPolicy("policy name cannot be empty"));
        }

        Ok(Self {
            name,
            description: String::new(),
            rules: Vec::new(),
            enabled: true,
            priority: 0,
        })
    }

    /// Built-in policy redacting `email`, `phone`, `ssn`, and `credit_card`
    /// top-level fields, at priority 100.
    #[must_use]
    pub fn default_pii_protection() -> Self {
        let rules = ["email", "phone", "ssn", "credit_card"]
            .into_iter()
            .filter_map(|field| PolicyRule::exists(field, RuleAction::Redact).ok())
            .collect();

        Self {
            name: PII_PROTECTION.to_owned(),
            description: "Default PII protection policy".to_owned(),
            rules,
            enabled: true,
            priority: 100,
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends several rules in order.
    #[must_use]
    pub fn with_rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = PolicyRule>,
    {
        self.rules.extend(rules);
        self
    }

    /// Sets the evaluation priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Enables or disables the policy.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the unique policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Returns true when the policy takes part in evaluation.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the evaluation priority.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }
}

impl TryFrom<PolicySpec> for Policy {
    type Error = PolicyError;

    fn try_from(spec: PolicySpec) -> Result<Self, Self::Error> {
        Ok(Self::new(spec.name)?
            .with_description(spec.description)
            .with_rules(spec.rules)
            .with_enabled(spec.enabled)
            .with_priority(spec.priority))
    }
}
