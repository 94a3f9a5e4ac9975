//! PII categories and their overlap priorities.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of personally identifiable information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiType {
    /// `local@domain.tld` email address.
    Email,
    /// North-American phone number.
    Phone,
    /// US social security number in `ddd-dd-dddd` form.
    Ssn,
    /// 13 to 19 digit card number passing the Luhn checksum.
    CreditCard,
    /// Dotted-quad IPv4 address.
    IpAddress,
    /// Secret token starting with `sk_`, `api_`, `key_`, or `token_`.
    ApiKey,
}

impl PiiType {
    /// Every category, in detection order.
    pub const ALL: [Self; 6] = [
        Self::Email,
        Self::Phone,
        Self::Ssn,
        Self::CreditCard,
        Self::IpAddress,
        Self::ApiKey,
    ];

    /// Returns the stable wire name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Ssn => "ssn",
            Self::CreditCard => "credit_card",
            Self::IpAddress => "ip_address",
            Self::ApiKey => "api_key",
        }
    }

    /// Overlap priority; on intersecting detections the higher value is kept.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::CreditCard => 6,
            Self::Ssn => 5,
            Self::ApiKey => 4,
            Self::Phone => 3,
            Self::IpAddress => 2,
            Self::Email => 1,
        }
    }

    /// Replacement token inserted in place of a detection.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Email => "[REDACTED_EMAIL]",
            Self::Phone => "[REDACTED_PHONE]",
            Self::Ssn => "[REDACTED_SSN]",
            Self::CreditCard => "[REDACTED_CREDIT_CARD]",
            Self::IpAddress => "[REDACTED_IP_ADDRESS]",
            Self::ApiKey => "[REDACTED_API_KEY]",
        }
    }
}

impl Display for PiiType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown PII category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pii type `{0}`")]
pub struct UnknownPiiType(pub String);

impl FromStr for PiiType {
    type Err = UnknownPiiType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownPiiType(s.to_owned()))
    }
}
