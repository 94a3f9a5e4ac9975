//! Policy decision types returned by the engine.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Outcome of a policy evaluation.
///
/// Variants are ordered by precedence, so `max` of two decisions is the one
/// that wins: `Deny > Redact > Allow`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Action is permitted unchanged.
    #[default]
    Allow,
    /// Action is permitted with parts of its payload replaced.
    Redact,
    /// Action is rejected outright.
    Deny,
}

impl Decision {
    /// Returns the stable wire name of the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Redact => "redact",
            Self::Deny => "deny",
        }
    }

    /// Returns true when the action may proceed unchanged.
    #[must_use]
    pub fn is_allow(self) -> bool {
        self == Self::Allow
    }

    /// Returns true when the action may proceed with a modified payload.
    #[must_use]
    pub fn is_redact(self) -> bool {
        self == Self::Redact
    }

    /// Returns true when the action is rejected.
    #[must_use]
    pub fn is_deny(self) -> bool {
        self == Self::Deny
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
