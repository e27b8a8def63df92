//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::BillingError;

/// Billing core record identifier (`elid`).
///
/// The core hands out decimal ids; anything else in an `elid` slot is a
/// malformed request and is rejected before it reaches the control utility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElId(String);

impl ElId {
    /// Parses an id, naming `field` in the error if it is malformed.
    pub fn parse(field: &str, raw: &str) -> Result<Self, BillingError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BillingError::missing(field));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(BillingError::invalid_value(field, raw, "must be a numeric id"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as sent to the control utility.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the `0` placeholder the daemon passes for "none".
    pub fn is_zero(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }
}

impl fmt::Display for ElId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ElId {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("elid", s)
    }
}
