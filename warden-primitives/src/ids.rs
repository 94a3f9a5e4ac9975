//! Receipt identifiers.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Identifies one signed policy receipt.
///
/// Always rendered in hyphenated lowercase UUID form. That string is what the
/// receipt signature covers, what serde writes, and what file-backed stores
/// use to name the receipt's document, so all three must agree.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(Uuid);

impl ReceiptId {
    /// Issues an identifier for a freshly created receipt.
    #[must_use]
    pub fn issue() -> Self {
        Self(Uuid::new_v4())
    }

    /// Name of the JSON document holding this receipt in a directory store.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{self}.json")
    }
}

impl Display for ReceiptId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0.hyphenated(), f)
    }
}

impl From<Uuid> for ReceiptId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for ReceiptId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
