//! Text and document redaction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::luhn::luhn_check;
use crate::patterns::pattern;
use crate::PiiType;

/// A single PII detection within a piece of text.
///
/// `start` and `end` are byte offsets into the scanned text, so
/// `&text[start..end] == original` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiMatch {
    /// Category of the detection.
    pub pii_type: PiiType,
    /// Text that was detected.
    pub original: String,
    /// Token that replaced the detection.
    pub redacted: String,
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

/// Outcome of redacting one piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionResult {
    /// Text as supplied.
    pub original_text: String,
    /// Text with every detection replaced by its token.
    pub redacted_text: String,
    /// Surviving detections in ascending offset order.
    pub matches: Vec<PiiMatch>,
}

impl RedactionResult {
    fn unchanged(text: String) -> Self {
        Self {
            original_text: text.clone(),
            redacted_text: text,
            matches: Vec::new(),
        }
    }

    /// Returns true when at least one detection survived overlap filtering.
    #[must_use]
    pub fn pii_found(&self) -> bool {
        !self.matches.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Candidate<'t> {
    kind: PiiType,
    start: usize,
    end: usize,
    original: &'t str,
}

impl Candidate<'_> {
    fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Detects and redacts personally identifiable information.
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    enabled_types: Vec<PiiType>,
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::new()
    }
}

impl PiiRedactor {
    /// Creates a redactor that detects every category.
    #[must_use]
    pub fn new() -> Self {
        Self::with_types(PiiType::ALL)
    }

    /// Creates a redactor restricted to the supplied categories.
    ///
    /// An empty set is valid and detects nothing.
    #[must_use]
    pub fn with_types<I>(types: I) -> Self
    where
        I: IntoIterator<Item = PiiType>,
    {
        let mut enabled_types: Vec<PiiType> = Vec::new();
        for kind in types {
            if !enabled_types.contains(&kind) {
                enabled_types.push(kind);
            }
        }

        info!(
            enabled_types = ?enabled_types.iter().map(|kind| kind.as_str()).collect::<Vec<_>>(),
            "pii redactor initialised"
        );
        Self { enabled_types }
    }

    /// Returns the categories this redactor detects.
    #[must_use]
    pub fn enabled_types(&self) -> &[PiiType] {
        &self.enabled_types
    }

    /// Returns true when `kind` is detected by this redactor.
    #[must_use]
    pub fn is_enabled(&self, kind: PiiType) -> bool {
        self.enabled_types.contains(&kind)
    }

    /// Redacts every detection in `text`.
    #[must_use]
    pub fn redact_text(&self, text: &str) -> RedactionResult {
        let mut candidates = Vec::new();
        for kind in PiiType::ALL {
            if self.is_enabled(kind) {
                detect(kind, text, &mut candidates);
            }
        }

        let mut survivors = resolve_overlaps(candidates);
        // Right-to-left replacement keeps the offsets of earlier matches valid.
        survivors.sort_by(|a, b| b.start.cmp(&a.start));

        let mut redacted_text = text.to_owned();
        let mut matches = Vec::with_capacity(survivors.len());
        for candidate in &survivors {
            let token = candidate.kind.token();
            redacted_text.replace_range(candidate.start..candidate.end, token);
            matches.push(PiiMatch {
                pii_type: candidate.kind,
                original: candidate.original.to_owned(),
                redacted: token.to_owned(),
                start: candidate.start,
                end: candidate.end,
            });
        }
        matches.reverse();

        debug!(pii_count = matches.len(), "text redacted");
        RedactionResult {
            original_text: text.to_owned(),
            redacted_text,
            matches,
        }
    }

    /// Redacts a JSON value.
    ///
    /// Strings are scanned; any other value is rendered to its JSON text and
    /// returned unchanged with no detections.
    #[must_use]
    pub fn redact_value(&self, value: &Value) -> RedactionResult {
        match value {
            Value::String(text) => self.redact_text(text),
            other => RedactionResult::unchanged(other.to_string()),
        }
    }

    /// Recursively redacts every string inside `data`.
    ///
    /// Nested objects recurse; arrays have their string and object elements
    /// redacted; every other value is copied unchanged. Returns the redacted
    /// copy together with all detections in traversal order.
    #[must_use]
    pub fn redact_dict(&self, data: &Map<String, Value>) -> (Map<String, Value>, Vec<PiiMatch>) {
        let mut all_matches = Vec::new();
        let redacted = self.redact_map(data, &mut all_matches);
        debug!(pii_count = all_matches.len(), "document redacted");
        (redacted, all_matches)
    }

    fn redact_map(
        &self,
        data: &Map<String, Value>,
        all_matches: &mut Vec<PiiMatch>,
    ) -> Map<String, Value> {
        let mut redacted = Map::new();
        for (key, value) in data {
            let value = match value {
                Value::String(text) => self.redact_string(text, all_matches),
                Value::Object(nested) => Value::Object(self.redact_map(nested, all_matches)),
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(text) => self.redact_string(text, all_matches),
                            Value::Object(nested) => {
                                Value::Object(self.redact_map(nested, all_matches))
                            }
                            other => other.clone(),
                        })
                        .collect(),
                ),
                other => other.clone(),
            };
            redacted.insert(key.clone(), value);
        }
        redacted
    }

    fn redact_string(&self, text: &str, all_matches: &mut Vec<PiiMatch>) -> Value {
        let result = self.redact_text(text);
        all_matches.extend(result.matches);
        Value::String(result.redacted_text)
    }
}

fn detect<'t>(kind: PiiType, text: &'t str, out: &mut Vec<Candidate<'t>>) {
    for found in pattern(kind).find_iter(text) {
        if kind == PiiType::CreditCard && !is_card_number(found.as_str()) {
            continue;
        }
        out.push(Candidate {
            kind,
            start: found.start(),
            end: found.end(),
            original: found.as_str(),
        });
    }
}

fn is_card_number(candidate: &str) -> bool {
    let digits: String = candidate
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    (13..=19).contains(&digits.len()) && luhn_check(&digits)
}

/// Keeps the highest-priority detection of every group of intersecting
/// ranges. The result is pairwise non-overlapping, in ascending offset order.
fn resolve_overlaps(mut candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    candidates.sort_by(|a, b| {
        b.kind
            .priority()
            .cmp(&a.kind.priority())
            .then(a.start.cmp(&b.start))
    });

    let mut kept: Vec<Candidate<'_>> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !kept.iter().any(|existing| existing.overlaps(&candidate)) {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|candidate| candidate.start);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn redactor() -> PiiRedactor {
        PiiRedactor::new()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn assert_well_formed(result: &RedactionResult) {
        for pair in result.matches.windows(2) {
            assert!(pair[0].end <= pair[1].start, "overlap in {:?}", result.matches);
        }
        for found in &result.matches {
            assert!(found.start < found.end);
            assert_eq!(&result.original_text[found.start..found.end], found.original);
        }
        assert_eq!(
            result.redacted_text.matches("[REDACTED_").count(),
            result.matches.len()
        );
    }

    #[test]
    fn redactor_enables_every_type_by_default() {
        assert_eq!(redactor().enabled_types().len(), 6);
    }

    #[test]
    fn detects_email() {
        let result = redactor().redact_text("Contact alice@example.com for details");

        assert!(result.pii_found());
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].pii_type, PiiType::Email);
        assert_eq!(result.matches[0].original, "alice@example.com");
        assert_eq!(
            result.redacted_text,
            "Contact [REDACTED_EMAIL] for details"
        );
    }

    #[test]
    fn detects_phone_variations() {
        for text in [
            "Call me at 555-123-4567",
            "Call (555) 123-4567",
            "Call +1 555 123 4567",
            "Call 555.123.4567",
        ] {
            let result = redactor().redact_text(text);
            assert_eq!(result.matches.len(), 1, "{text}");
            assert_eq!(result.matches[0].pii_type, PiiType::Phone, "{text}");
            assert!(result.redacted_text.contains("[REDACTED_PHONE]"));
            assert_well_formed(&result);
        }
    }

    #[test]
    fn ssn_wins_over_phone() {
        let result = redactor().redact_text("SSN: 123-45-6789");

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].pii_type, PiiType::Ssn);
        assert_eq!(result.matches[0].original, "123-45-6789");
        assert_eq!(result.redacted_text, "SSN: [REDACTED_SSN]");
    }

    #[test]
    fn detects_credit_cards_with_separators() {
        for text in [
            "Card: 4532015112830366",
            "Card: 4532-0151-1283-0366",
            "Card: 5555 5555 5555 4444",
        ] {
            let result = redactor().redact_text(text);
            assert_eq!(result.matches.len(), 1, "{text}");
            assert_eq!(result.matches[0].pii_type, PiiType::CreditCard, "{text}");
            assert_eq!(result.redacted_text, "Card: [REDACTED_CREDIT_CARD]");
        }
    }

    #[test]
    fn luhn_invalid_numbers_are_not_cards() {
        let result = redactor().redact_text("Order 1234567890123456 shipped");
        assert!(
            result
                .matches
                .iter()
                .all(|found| found.pii_type != PiiType::CreditCard)
        );
        assert_well_formed(&result);
    }

    #[test]
    fn card_shadowing_phone_yields_single_token() {
        let result = redactor().redact_text("4111111111111111");

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].pii_type, PiiType::CreditCard);
        assert_eq!(result.redacted_text, "[REDACTED_CREDIT_CARD]");
        assert!(!result.redacted_text.contains("PHONE"));
    }

    #[test]
    fn detects_ip_addresses() {
        let result = redactor().redact_text("Servers 192.168.1.1 and 10.0.0.254 are up");

        assert_eq!(result.matches.len(), 2);
        assert!(
            result
                .matches
                .iter()
                .all(|found| found.pii_type == PiiType::IpAddress)
        );
        assert_eq!(result.matches[0].original, "192.168.1.1");
        assert_well_formed(&result);
    }

    #[test]
    fn detects_api_keys() {
        for text in [
            "Use key: sk_live_abcdefghijklmnopqrst",
            "key: api_key_1234567890123456789",
            "key: token_abcdefghijklmnopqrst",
        ] {
            let result = redactor().redact_text(text);
            assert_eq!(result.matches.len(), 1, "{text}");
            assert_eq!(result.matches[0].pii_type, PiiType::ApiKey, "{text}");
        }
    }

    #[test]
    fn short_prefixed_tokens_are_not_api_keys() {
        let result = redactor().redact_text("sk_short");
        assert!(!result.pii_found());
    }

    #[test]
    fn mixed_text_keeps_each_detection() {
        let result = redactor()
            .redact_text("Email: alice@example.com, SSN: 123-45-6789, Card: 4532-0151-1283-0366");

        let kinds: Vec<PiiType> = result.matches.iter().map(|found| found.pii_type).collect();
        assert_eq!(kinds, [PiiType::Email, PiiType::Ssn, PiiType::CreditCard]);
        assert_eq!(
            result.redacted_text,
            "Email: [REDACTED_EMAIL], SSN: [REDACTED_SSN], Card: [REDACTED_CREDIT_CARD]"
        );
        assert_well_formed(&result);
    }

    #[test]
    fn clean_text_is_returned_unchanged() {
        let text = "This is a normal sentence with no sensitive information.";
        let result = redactor().redact_text(text);

        assert!(!result.pii_found());
        assert!(result.matches.is_empty());
        assert_eq!(result.redacted_text, text);
    }

    #[test]
    fn offsets_are_byte_offsets() {
        let text = "naïve café owner: bob@example.org";
        let result = redactor().redact_text(text);

        assert_eq!(result.matches.len(), 1);
        let found = &result.matches[0];
        assert_eq!(&text[found.start..found.end], "bob@example.org");
    }

    #[test]
    fn disabled_types_are_ignored() {
        let redactor = PiiRedactor::with_types([PiiType::Email]);
        let result = redactor.redact_text("Email a@b.com or call 555-123-4567");

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].pii_type, PiiType::Email);
        assert!(result.redacted_text.contains("555-123-4567"));
    }

    #[test]
    fn empty_type_set_detects_nothing() {
        let redactor = PiiRedactor::with_types(std::iter::empty::<PiiType>());
        let result = redactor.redact_text("a@b.com 123-45-6789");
        assert!(!result.pii_found());
        assert_eq!(result.redacted_text, "a@b.com 123-45-6789");
    }

    #[test]
    fn non_string_values_pass_through() {
        let result = redactor().redact_value(&json!(12345));

        assert!(!result.pii_found());
        assert_eq!(result.original_text, "12345");
        assert_eq!(result.redacted_text, "12345");
    }

    #[test]
    fn redact_dict_walks_nested_structures() {
        let data = object(json!({
            "user": {"email": "bob@example.com", "phone": "555-123-4567", "name": "Bob"},
            "emails": ["a@example.com", "b@example.com"],
            "addresses": [{"ip": "192.168.1.1", "name": "Home"}],
            "age": 30,
            "verified": true,
            "nested_lists": [["c@example.com"]],
        }));

        let (redacted, matches) = redactor().redact_dict(&data);

        assert_eq!(matches.len(), 5);
        assert_eq!(redacted["user"]["email"], json!("[REDACTED_EMAIL]"));
        assert_eq!(redacted["user"]["phone"], json!("[REDACTED_PHONE]"));
        assert_eq!(redacted["user"]["name"], json!("Bob"));
        assert_eq!(
            redacted["emails"],
            json!(["[REDACTED_EMAIL]", "[REDACTED_EMAIL]"])
        );
        assert_eq!(redacted["addresses"][0]["ip"], json!("[REDACTED_IP_ADDRESS]"));
        assert_eq!(redacted["addresses"][0]["name"], json!("Home"));
        assert_eq!(redacted["age"], json!(30));
        assert_eq!(redacted["verified"], json!(true));
        assert_eq!(redacted["nested_lists"], json!([["c@example.com"]]));
    }

    #[test]
    fn redact_dict_leaves_input_untouched() {
        let data = object(json!({"email": "user@example.com"}));
        let _ = redactor().redact_dict(&data);
        assert_eq!(data["email"], json!("user@example.com"));
    }
}
