//! Compiled detection patterns.

use std::sync::LazyLock;

use regex::Regex;

use crate::PiiType;

const EMAIL: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b";
const PHONE: &str = r"(?:\+1)?[\s.-]?\(?(\d{3})\)?[\s.-]?(\d{3})[\s.-]?(\d{4})\b";
const SSN: &str = r"\b\d{3}-\d{2}-\d{4}\b";
const IP_ADDRESS: &str = r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b";
const API_KEY: &str = r"\b(?:sk_|api_|key_|token_)[a-zA-Z0-9_]{20,}\b";
const CREDIT_CARD: &str = r"\b(?:\d[\s-]*?){13,19}\b";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pii pattern compiles")
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| compile(EMAIL));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| compile(PHONE));
static SSN_RE: LazyLock<Regex> = LazyLock::new(|| compile(SSN));
static IP_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| compile(IP_ADDRESS));
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| compile(API_KEY));
static CREDIT_CARD_RE: LazyLock<Regex> = LazyLock::new(|| compile(CREDIT_CARD));

/// Returns the detection pattern for `kind`.
pub(crate) fn pattern(kind: PiiType) -> &'static Regex {
    match kind {
        PiiType::Email => &EMAIL_RE,
        PiiType::Phone => &PHONE_RE,
        PiiType::Ssn => &SSN_RE,
        PiiType::CreditCard => &CREDIT_CARD_RE,
        PiiType::IpAddress => &IP_ADDRESS_RE,
        PiiType::ApiKey => &API_KEY_RE,
    }
}
