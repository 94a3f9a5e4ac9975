//! Receipt model and HMAC signer.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::{debug, info};
use warden_pii::PiiType;
use warden_policy::{Decision, EvaluationRequest, EvaluationResult};
use warden_primitives::{ReceiptId, canonical_json, payload_digest};

use crate::error::{ComplianceError, ComplianceResult};

type HmacSha256 = Hmac<Sha256>;

/// Signed audit record of one evaluation.
///
/// Every field except `signature` is covered by the HMAC. Receipts
/// deserialize only when all required fields are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyReceipt {
    /// Unique receipt identifier.
    pub receipt_id: ReceiptId,
    /// When the evaluation finished.
    pub timestamp: DateTime<Utc>,
    /// Agent that requested the action.
    pub agent_id: String,
    /// Action that was evaluated.
    pub action: String,
    /// Decision reached.
    pub decision: Decision,
    /// Policies consulted, in evaluation order.
    #[serde(default)]
    pub policy_names: Vec<String>,
    /// Violation messages raised.
    #[serde(default)]
    pub violations: Vec<String>,
    /// SHA-256 of the canonical JSON of the submitted payload.
    pub payload_hash: String,
    /// SHA-256 of the canonical JSON of the rewritten payload, when there is one.
    #[serde(default)]
    pub modified_payload_hash: Option<String>,
    /// True when the detector found any PII.
    #[serde(default)]
    pub pii_redacted: bool,
    /// Distinct PII categories found, in order of first detection.
    #[serde(default)]
    pub pii_types_found: Vec<PiiType>,
    /// Lowercase hex HMAC-SHA256 over the other fields.
    pub signature: String,
}

impl PolicyReceipt {
    /// Document covered by the signature.
    fn signed_document(&self) -> Value {
        let pii_types: Vec<&str> = self.pii_types_found.iter().map(|kind| kind.as_str()).collect();
        json!({
            "receipt_id": self.receipt_id.to_string(),
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            "agent_id": self.agent_id,
            "action": self.action,
            "decision": self.decision.as_str(),
            "policy_names": self.policy_names,
            "violations": self.violations,
            "payload_hash": self.payload_hash,
            "modified_payload_hash": self.modified_payload_hash,
            "pii_redacted": self.pii_redacted,
            "pii_types_found": pii_types,
        })
    }
}

/// Creates and verifies [`PolicyReceipt`]s with a shared secret.
#[derive(Clone)]
pub struct ReceiptGenerator {
    mac: HmacSha256,
}

impl fmt::Debug for ReceiptGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiptGenerator").finish_non_exhaustive()
    }
}

impl ReceiptGenerator {
    /// Creates a generator keyed with `signing_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::InvalidSigningKey`] when the key is empty.
    pub fn new(signing_key: impl AsRef<[u8]>) -> ComplianceResult<Self> {
        let key = signing_key.as_ref();
        if key.is_empty() {
            return Err(ComplianceError::InvalidSigningKey("signing key cannot be empty"));
        }
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|_| ComplianceError::InvalidSigningKey("key rejected by hmac"))?;

        info!("receipt generator initialized");
        Ok(Self { mac })
    }

    /// Builds and signs a receipt for `result`, which must have been produced
    /// from `request`. Pass the consulted policy names, or an empty slice.
    #[must_use]
    pub fn create_receipt(
        &self,
        result: &EvaluationResult,
        request: &EvaluationRequest,
        policy_names: &[String],
    ) -> PolicyReceipt {
        let mut pii_types_found: Vec<PiiType> = Vec::new();
        for found in result.pii_matches() {
            if !pii_types_found.contains(&found.pii_type) {
                pii_types_found.push(found.pii_type);
            }
        }

        let mut receipt = PolicyReceipt {
            receipt_id: ReceiptId::issue(),
            timestamp: result.timestamp(),
            agent_id: request.agent_id().to_owned(),
            action: request.action().to_owned(),
            decision: result.decision(),
            policy_names: policy_names.to_vec(),
            violations: result.violations().to_vec(),
            payload_hash: payload_digest(result.original_payload()),
            modified_payload_hash: result.modified_payload().map(payload_digest),
            pii_redacted: !result.pii_matches().is_empty(),
            pii_types_found,
            signature: String::new(),
        };
        receipt.signature = self.sign(&receipt.signed_document());

        info!(
            receipt_id = %receipt.receipt_id,
            agent_id = receipt.agent_id.as_str(),
            decision = %receipt.decision,
            "receipt generated"
        );
        receipt
    }

    /// Alias of [`create_receipt`](Self::create_receipt).
    #[must_use]
    pub fn generate(
        &self,
        result: &EvaluationResult,
        request: &EvaluationRequest,
        policy_names: &[String],
    ) -> PolicyReceipt {
        self.create_receipt(result, request, policy_names)
    }

    /// Returns true when `receipt.signature` matches its contents under this key.
    ///
    /// The comparison runs in constant time. A malformed signature is reported
    /// as `false`, never as an error.
    #[must_use]
    pub fn verify(&self, receipt: &PolicyReceipt) -> bool {
        let valid = match hex::decode(&receipt.signature) {
            Ok(expected) => {
                let mut mac = self.mac.clone();
                mac.update(canonical_json(&receipt.signed_document()).as_bytes());
                mac.verify_slice(&expected).is_ok()
            }
            Err(_) => {
                debug!(receipt_id = %receipt.receipt_id, "receipt signature is not hex");
                false
            }
        };

        info!(receipt_id = %receipt.receipt_id, valid, "receipt verification");
        valid
    }

    fn sign(&self, document: &Value) -> String {
        let mut mac = self.mac.clone();
        mac.update(canonical_json(document).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_pii::PiiRedactor;
    use warden_policy::{GovernanceEngine, Policy, PolicyRule, RuleAction};
    use warden_primitives::Payload;

    fn engine() -> GovernanceEngine {
        GovernanceEngine::builder()
            .policy(
                Policy::new("deny-delete")
                    .unwrap()
                    .with_priority(10)
                    .with_rule(PolicyRule::equals("op", "delete", RuleAction::Deny).unwrap()),
            )
            .redactor(PiiRedactor::new())
            .build()
    }

    fn request(value: Value) -> EvaluationRequest {
        let Value::Object(payload) = value else {
            panic!("expected object");
        };
        EvaluationRequest::new("agent-7", "update_record").with_payload(payload)
    }

    fn signed_receipt() -> (ReceiptGenerator, PolicyReceipt) {
        let engine = engine();
        let request = request(json!({
            "contact": "jane@example.com",
            "note": "also jane@example.org and 123-45-6789"
        }));
        let result = engine.evaluate(&request);
        let generator = ReceiptGenerator::new("test-signing-key").unwrap();
        let receipt = generator.create_receipt(&result, &request, &engine.policy_names());
        (generator, receipt)
    }

    #[test]
    fn genuine_receipt_verifies() {
        let (generator, receipt) = signed_receipt();
        assert!(generator.verify(&receipt));
        assert_eq!(receipt.signature.len(), 64);
    }

    #[test]
    fn receipt_reflects_result() {
        let (_, receipt) = signed_receipt();

        assert_eq!(receipt.agent_id, "agent-7");
        assert_eq!(receipt.action, "update_record");
        assert_eq!(receipt.decision, Decision::Redact);
        assert_eq!(receipt.policy_names, ["deny-delete"]);
        assert!(receipt.pii_redacted);
        assert_eq!(receipt.pii_types_found, [PiiType::Email, PiiType::Ssn]);
        assert!(receipt.modified_payload_hash.is_some());
        assert_ne!(receipt.modified_payload_hash.as_ref(), Some(&receipt.payload_hash));
    }

    #[test]
    fn allowed_result_has_no_modified_hash() {
        let generator = ReceiptGenerator::new("k").unwrap();
        let request = request(json!({"op": "read"}));
        let result = engine().evaluate(&request);

        let receipt = generator.create_receipt(&result, &request, &[]);
        assert_eq!(receipt.decision, Decision::Allow);
        assert!(receipt.modified_payload_hash.is_none());
        assert!(!receipt.pii_redacted);
        assert!(receipt.policy_names.is_empty());
        assert!(generator.verify(&receipt));
    }

    #[test]
    fn any_single_field_tamper_is_detected() {
        let (generator, receipt) = signed_receipt();
        let tampers: Vec<fn(&mut PolicyReceipt)> = vec![
            |r: &mut PolicyReceipt| r.agent_id = "agent-8".into(),
            |r: &mut PolicyReceipt| r.action = "delete_record".into(),
            |r: &mut PolicyReceipt| r.decision = Decision::Allow,
            |r: &mut PolicyReceipt| r.payload_hash = "0".repeat(64),
            |r: &mut PolicyReceipt| r.modified_payload_hash = None,
            |r: &mut PolicyReceipt| r.pii_redacted = false,
            |r: &mut PolicyReceipt| r.pii_types_found.truncate(1),
            |r: &mut PolicyReceipt| r.violations.clear(),
            |r: &mut PolicyReceipt| r.policy_names.push("extra".into()),
            |r: &mut PolicyReceipt| r.receipt_id = ReceiptId::issue(),
            |r: &mut PolicyReceipt| r.timestamp += chrono::Duration::seconds(1),
        ];

        for tamper in tampers {
            let mut forged = receipt.clone();
            tamper(&mut forged);
            assert!(!generator.verify(&forged), "tampered receipt verified: {forged:?}");
        }
    }

    #[test]
    fn different_key_rejects_identical_content() {
        let (_, receipt) = signed_receipt();
        let other = ReceiptGenerator::new("another-key").unwrap();
        assert!(!other.verify(&receipt));
    }

    #[test]
    fn malformed_signature_is_false_not_error() {
        let (generator, mut receipt) = signed_receipt();
        receipt.signature = "not-hex".into();
        assert!(!generator.verify(&receipt));
        receipt.signature = String::new();
        assert!(!generator.verify(&receipt));
    }

    #[test]
    fn json_roundtrip_still_verifies() {
        let (generator, receipt) = signed_receipt();
        let encoded = serde_json::to_string_pretty(&receipt).unwrap();
        let decoded: PolicyReceipt = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, receipt);
        assert!(generator.verify(&decoded));
    }

    #[test]
    fn missing_required_field_fails_to_deserialize() {
        let (_, receipt) = signed_receipt();
        let mut value = serde_json::to_value(&receipt).unwrap();
        value.as_object_mut().unwrap().remove("signature");
        assert!(serde_json::from_value::<PolicyReceipt>(value).is_err());
    }

    #[test]
    fn empty_key_is_rejected_and_key_never_printed() {
        assert!(matches!(
            ReceiptGenerator::new(""),
            Err(ComplianceError::InvalidSigningKey(_))
        ));
        let generator = ReceiptGenerator::new("super-secret").unwrap();
        assert!(!format!("{generator:?}").contains("super-secret"));
    }

    #[test]
    fn payload_hash_ignores_key_order() {
        let generator = ReceiptGenerator::new("k").unwrap();
        let mut first = Payload::new();
        first.insert("a".into(), json!(1));
        first.insert("b".into(), json!(2));
        let mut second = Payload::new();
        second.insert("b".into(), json!(2));
        second.insert("a".into(), json!(1));

        let engine = GovernanceEngine::new();
        let one = EvaluationRequest::new("x", "y").with_payload(first);
        let two = EvaluationRequest::new("x", "y").with_payload(second);
        let r1 = generator.create_receipt(&engine.evaluate(&one), &one, &[]);
        let r2 = generator.create_receipt(&engine.evaluate(&two), &two, &[]);
        assert_eq!(r1.payload_hash, r2.payload_hash);
    }
}
