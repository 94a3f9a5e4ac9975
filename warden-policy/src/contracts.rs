//! Request and result contracts for governance evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_pii::PiiMatch;
use warden_primitives::Payload;

use crate::decision::Decision;

/// Single action an agent wants to perform, submitted for evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    agent_id: String,
    action: String,
    #[serde(default)]
    payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Payload>,
}

impl EvaluationRequest {
    /// Creates a request with an empty payload.
    #[must_use]
    pub fn new(agent_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            action: action.into(),
            payload: Payload::new(),
            metadata: None,
        }
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Inserts a single top-level payload field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Attaches caller metadata. Metadata never takes part in rule matching.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Payload) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the identifier of the requesting agent.
    #[must_use]
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Returns the action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the payload as supplied by the caller.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the caller metadata, if any.
    #[must_use]
    pub fn metadata(&self) -> Option<&Payload> {
        self.metadata.as_ref()
    }
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    decision: Decision,
    reason: String,
    original_payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified_payload: Option<Payload>,
    #[serde(default)]
    violations: Vec<String>,
    #[serde(default)]
    pii_matches: Vec<PiiMatch>,
    timestamp: DateTime<Utc>,
}

impl EvaluationResult {
    /// Creates a result stamped with the current time.
    #[must_use]
    pub fn new(decision: Decision, reason: impl Into<String>, original_payload: Payload) -> Self {
        Self {
            decision,
            reason: reason.into(),
            original_payload,
            modified_payload: None,
            violations: Vec::new(),
            pii_matches: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Sets the rewritten payload.
    #[must_use]
    pub fn with_modified_payload(mut self, payload: Payload) -> Self {
        self.modified_payload = Some(payload);
        self
    }

    /// Sets the violation messages.
    #[must_use]
    pub fn with_violations(mut self, violations: Vec<String>) -> Self {
        self.violations = violations;
        self
    }

    /// Sets the PII detections.
    #[must_use]
    pub fn with_pii_matches(mut self, matches: Vec<PiiMatch>) -> Self {
        self.pii_matches = matches;
        self
    }

    /// Overrides the evaluation timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns the decision.
    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Returns the human-readable reason for the decision.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the payload exactly as it was submitted.
    #[must_use]
    pub fn original_payload(&self) -> &Payload {
        &self.original_payload
    }

    /// Returns the rewritten payload. Present only for [`Decision::Redact`].
    #[must_use]
    pub fn modified_payload(&self) -> Option<&Payload> {
        self.modified_payload.as_ref()
    }

    /// Payload the caller should forward: the modified one when present,
    /// otherwise the original.
    #[must_use]
    pub fn effective_payload(&self) -> &Payload {
        self.modified_payload
            .as_ref()
            .unwrap_or(&self.original_payload)
    }

    /// Returns the violation messages in the order they were raised.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Returns the PII detections in the order they were found.
    #[must_use]
    pub fn pii_matches(&self) -> &[PiiMatch] {
        &self.pii_matches
    }

    /// Returns when the evaluation finished.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns true when the action may proceed, possibly with a modified payload.
    #[must_use]
    pub fn is_permitted(&self) -> bool {
        !self.decision.is_deny()
    }
}
