//! Exact monetary amounts.
//!
//! Amounts arrive as strings from three places (the billing core, the
//! provider callback, and the provider API). They are compared as exact
//! decimals in minor units, never as floats or raw strings.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::BillingError;

/// Maximum number of fraction digits a currency amount may carry.
const MINOR_UNIT_DIGITS: u32 = 2;

/// A non-negative amount with at most two fraction digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    /// Parses an amount, naming `field` in the error.
    ///
    /// `"100"`, `"100.0"` and `"100.00"` are the same amount; `"100.001"`,
    /// `"1e2"` and `"-5"` are rejected.
    pub fn parse(field: &str, raw: &str) -> Result<Self, BillingError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BillingError::missing(field));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(BillingError::invalid_value(field, raw, "not a decimal amount"));
        }
        let value = Decimal::from_str(trimmed)
            .map_err(|_| BillingError::invalid_value(field, raw, "not a decimal amount"))?;
        if value.scale() > MINOR_UNIT_DIGITS {
            return Err(BillingError::invalid_value(
                field,
                raw,
                "more than two fraction digits",
            ));
        }
        Ok(Self(value.normalize()))
    }

    /// Value in minor currency units (kopecks, cents).
    pub fn minor_units(&self) -> i64 {
        (self.0 * Decimal::from(100)).to_i64().unwrap_or(i64::MAX)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_amounts_with_different_precision_compare_equal() {
        let a = Amount::parse("amount", "100").unwrap();
        let b = Amount::parse("amount", "100.00").unwrap();
        let c = Amount::parse("amount", "100.0").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.minor_units(), 10000);
    }

    #[test]
    fn different_amounts_compare_unequal() {
        let a = Amount::parse("amount", "100.00").unwrap();
        let b = Amount::parse("amount", "100.01").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn display_always_has_two_digits() {
        assert_eq!(Amount::parse("amount", "5").unwrap().to_string(), "5.00");
        assert_eq!(Amount::parse("amount", "5.5").unwrap().to_string(), "5.50");
    }

    #[test]
    fn rejects_sub_minor_precision() {
        assert!(Amount::parse("amount", "1.001").is_err());
    }

    #[test]
    fn rejects_signs_exponents_and_garbage() {
        for raw in ["-1.00", "1e2", "abc", "1,00", ""] {
            assert!(Amount::parse("amount", raw).is_err(), "{raw} should be rejected");
        }
    }
}
