use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Value, json};
use warden::adapters::Enforcer;
use warden::compliance::{FileReceiptStore, ReceiptGenerator, ReceiptStore};
use warden::config::GovernanceConfig;
use warden::pii::PiiRedactor;
use warden::policy::{
    Decision, EvaluationRequest, Evaluator, GovernanceEngine, PolicyLoader, REDACTED_PLACEHOLDER,
};
use warden::primitives::Payload;

fn templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../templates/policies")
}

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

#[test]
fn shipped_templates_load_in_priority_order() {
    let engine = GovernanceEngine::builder()
        .policies(PolicyLoader::load_dir(templates_dir()).unwrap())
        .build();

    assert_eq!(
        engine.policy_names(),
        [
            "hipaa-compliance",
            "pii-protection",
            "api-security",
            "content-moderation"
        ]
    );
    for name in engine.policy_names() {
        assert!(engine.policy(&name).unwrap().rules().len() >= 3, "{name}");
    }
}

#[test]
fn templates_enforce_their_intent() {
    let engine = GovernanceEngine::builder()
        .policies(PolicyLoader::load_dir(templates_dir()).unwrap())
        .auto_redaction(false)
        .build();

    let internal = EvaluationRequest::new("agent", "http_call").with_field("source_ip", "192.168.1.1");
    assert_eq!(engine.evaluate(&internal).decision(), Decision::Deny);

    let spam = EvaluationRequest::new("agent", "post").with_field("content", "CLICK HERE NOW for VIAGRA");
    assert_eq!(engine.evaluate(&spam).decision(), Decision::Deny);

    let email = EvaluationRequest::new("agent", "store").with_payload(payload(json!({
        "user_email": "john.doe@example.com",
        "public_info": "Hello world"
    })));
    let result = engine.evaluate(&email);
    assert_eq!(result.decision(), Decision::Redact);
    let modified = result.modified_payload().unwrap();
    assert_eq!(modified["user_email"], json!(REDACTED_PLACEHOLDER));
    assert_eq!(modified["public_info"], json!("Hello world"));

    let patient = EvaluationRequest::new("agent", "share").with_payload(payload(json!({
        "patient": {"ssn": "123-45-6789", "name": "Jane"},
        "destination": "external"
    })));
    let result = engine.evaluate(&patient);
    assert_eq!(result.decision(), Decision::Deny);
    assert_eq!(result.reason(), "Denied by policy 'hipaa-compliance' rule");
}

#[tokio::test]
async fn evaluate_sign_store_and_verify() {
    let dir = tempfile::tempdir().unwrap();
    let engine = GovernanceEngine::with_default_protection();
    let generator = ReceiptGenerator::new("pipeline-key").unwrap();
    let store = FileReceiptStore::open(dir.path()).await.unwrap();

    let request = EvaluationRequest::new("billing-agent", "charge").with_payload(payload(json!({
        "card": "4111 1111 1111 1111",
        "email": "payer@example.com",
        "amount": 42
    })));
    let result = engine.evaluate(&request);
    assert_eq!(result.decision(), Decision::Redact);
    let modified = result.modified_payload().unwrap();
    assert_eq!(modified["card"], json!("[REDACTED_CREDIT_CARD]"));
    assert_eq!(modified["email"], json!(REDACTED_PLACEHOLDER));
    assert_eq!(modified["amount"], json!(42));

    let receipt = generator.create_receipt(&result, &request, &engine.policy_names());
    store.save(&receipt).await.unwrap();

    let stored = store.get(&receipt.receipt_id).await.unwrap().unwrap();
    assert!(generator.verify(&stored));

    let mut forged = stored.clone();
    forged.decision = Decision::Allow;
    assert!(!generator.verify(&forged));

    let listed = store.list_by_agent("billing-agent", 100).await.unwrap();
    assert_eq!(listed, [receipt]);
}

#[test]
fn config_driven_enforcement() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("warden.yaml");
    std::fs::write(
        &config_path,
        format!(
            "engine:\n  auto_redaction: true\npolicies:\n  paths: [{}]\npii:\n  enabled_types: [email, api_key]\n",
            templates_dir().join("api-security.yaml").display()
        ),
    )
    .unwrap();

    let config = GovernanceConfig::from_path(&config_path).unwrap();
    let engine: Arc<dyn Evaluator> = Arc::new(config.build_engine().unwrap());
    let enforcer = Enforcer::new(engine, "config-agent")
        .with_receipts(ReceiptGenerator::new("config-key").unwrap());

    let forwarded = enforcer
        .enforce(
            "http_call",
            payload(json!({"url": "https://example.com", "body": "token_abcdefghijklmnopqrstuv"})),
            None,
        )
        .unwrap();
    assert_eq!(forwarded["body"], json!("[REDACTED_API_KEY]"));

    let blocked = enforcer
        .enforce("http_call", payload(json!({"url": "http://169.254.169.254/latest"})), None)
        .unwrap_err();
    assert!(blocked.to_string().starts_with("Denied by policy 'api-security' rule"));
    assert_eq!(enforcer.receipts().len(), 2);
}

#[test]
fn redactor_is_usable_standalone() {
    let redactor = PiiRedactor::new();
    let result = redactor.redact_text("reach me at 555-867-5309 or ops@example.com");

    assert_eq!(result.matches.len(), 2);
    assert_eq!(
        result.redacted_text.matches("[REDACTED_").count(),
        result.matches.len()
    );
    for pair in result.matches.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }
}
