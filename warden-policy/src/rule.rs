//! Declarative policy rules.

use std::fmt::{self, Display, Formatter};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_primitives::Payload;
use warden_primitives::payload::lookup;

use crate::error::{PolicyError, PolicyResult};

/// Comparison applied between the addressed payload value and the rule value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Exact JSON equality (numbers compare by value).
    #[default]
    Equals,
    /// Substring test for strings, membership test for arrays.
    Contains,
    /// Unanchored regular-expression search over strings.
    Regex,
    /// Field is present and not `null`.
    Exists,
}

impl Operator {
    /// Returns the stable wire name of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::Regex => "regex",
            Self::Exists => "exists",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect of a matching rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// No effect on the decision.
    #[default]
    Allow,
    /// Reject the request.
    Deny,
    /// Replace the addressed field with a placeholder.
    Redact,
}

impl RuleAction {
    /// Returns the stable wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Redact => "redact",
        }
    }
}

impl Display for RuleAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document form of a rule, as written in policy files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleSpec {
    field: String,
    #[serde(default)]
    operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default)]
    action: RuleAction,
}

/// Single field-path, operator, value, and action tuple.
///
/// Rules are validated on construction: regular expressions are compiled once
/// and operators that compare against a value must carry one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RuleSpec", into = "RuleSpec")]
pub struct PolicyRule {
    field: String,
    operator: Operator,
    value: Option<Value>,
    action: RuleAction,
    compiled: Option<Regex>,
}

impl PartialEq for PolicyRule {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.operator == other.operator
            && self.value == other.value
            && self.action == other.action
    }
}

impl PolicyRule {
    /// Creates a validated rule.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRule`] when the field path is empty or
    /// when a `regex` value is not a string holding a valid pattern.
    ///
    /// A comparison rule without a value (or with `null`) is accepted and
    /// never matches.
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: Option<Value>,
        action: RuleAction,
    ) -> PolicyResult<Self> {
        let field = field.into();
        if field.trim().is_empty() || field.split('.').any(str::is_empty) {
            return Err(PolicyError::invalid_rule(
                field,
                "field path cannot be empty or contain empty segments",
            ));
        }

        let compiled = match (operator, &value) {
            (Operator::Exists, _) | (_, None | Some(Value::Null)) => None,
            (Operator::Regex, Some(Value::String(pattern))) => {
                let compiled = Regex::new(pattern).map_err(|err| {
                    PolicyError::invalid_rule(field.clone(), format!("invalid regex: {err}"))
                })?;
                Some(compiled)
            }
            (Operator::Regex, Some(_)) => {
                return Err(PolicyError::invalid_rule(
                    field,
                    "regex value must be a string",
                ));
            }
            _ => None,
        };

        Ok(Self {
            field,
            operator,
            value,
            action,
            compiled,
        })
    }

    /// Rule matching whenever `field` is present.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRule`] when the field path is empty.
    pub fn exists(field: impl Into<String>, action: RuleAction) -> PolicyResult<Self> {
        Self::new(field, Operator::Exists, None, action)
    }

    /// Rule matching when `field` equals `value`.
    ///
    /// # Errors
    ///
    /// See [`PolicyRule::new`].
    pub fn equals(
        field: impl Into<String>,
        value: impl Into<Value>,
        action: RuleAction,
    ) -> PolicyResult<Self> {
        Self::new(field, Operator::Equals, Some(value.into()), action)
    }

    /// Rule matching when `field` contains `value`.
    ///
    /// # Errors
    ///
    /// See [`PolicyRule::new`].
    pub fn contains(
        field: impl Into<String>,
        value: impl Into<Value>,
        action: RuleAction,
    ) -> PolicyResult<Self> {
        Self::new(field, Operator::Contains, Some(value.into()), action)
    }

    /// Rule matching when `pattern` is found in the string at `field`.
    ///
    /// # Errors
    ///
    /// See [`PolicyRule::new`].
    pub fn regex(
        field: impl Into<String>,
        pattern: impl Into<String>,
        action: RuleAction,
    ) -> PolicyResult<Self> {
        Self::new(
            field,
            Operator::Regex,
            Some(Value::String(pattern.into())),
            action,
        )
    }

    /// Returns the dot-separated field path.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the comparison operator.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the comparison value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns the action applied on match.
    #[must_use]
    pub fn action(&self) -> RuleAction {
        self.action
    }

    /// Short `field operator` description used in violation messages.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{} {}", self.field, self.operator)
    }

    /// Tests the rule against `payload`.
    #[must_use]
    pub fn matches(&self, payload: &Payload) -> bool {
        let Some(actual) = lookup(payload, &self.field) else {
            return false;
        };

        match self.operator {
            Operator::Exists => true,
            Operator::Equals => match self.value.as_ref() {
                None | Some(Value::Null) => false,
                Some(expected) => values_equal(actual, expected),
            },
            Operator::Contains => match (actual, self.value.as_ref()) {
                (Value::String(haystack), Some(Value::String(needle))) => {
                    haystack.contains(needle.as_str())
                }
                (Value::Array(items), Some(expected)) if !expected.is_null() => {
                    items.iter().any(|item| values_equal(item, expected))
                }
                _ => false,
            },
            Operator::Regex => match (actual, self.compiled.as_ref()) {
                (Value::String(text), Some(pattern)) => pattern.is_match(text),
                _ => false,
            },
        }
    }
}

impl TryFrom<RuleSpec> for PolicyRule {
    type Error = PolicyError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        Self::new(spec.field, spec.operator, spec.value, spec.action)
    }
}

impl From<PolicyRule> for RuleSpec {
    fn from(rule: PolicyRule) -> Self {
        Self {
            field: rule.field,
            operator: rule.operator,
            value: rule.value,
            action: rule.action,
        }
    }
}

#[allow(clippy::float_cmp)]
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            a == b || a.as_f64().zip(b.as_f64()).is_some_and(|(x, y)| x == y)
        }
        _ => actual == expected,
    }
}
