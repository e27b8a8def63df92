//! Provider status vocabularies folded into [`PaymentOutcome`].
//!
//! Every classification first checks that the amount and currency the
//! provider reports match the payment record. A mismatch is `Error`
//! whatever status the provider claims.

use serde_json::Value;

use super::PaymentOutcome;
use crate::domain::foundation::{Amount, BillingError};

/// Which provider vocabulary a status string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusVocabulary {
    /// QIWI pull-bill notification `status`.
    QiwiBill,
    /// PayMaster `/direct/payment/complete` transaction `status`.
    PayMasterTransaction,
    /// PayMaster payment notification; delivery itself means paid.
    PayMasterNotification,
}

impl StatusVocabulary {
    /// Maps a status string without any settlement check.
    pub fn outcome_for(&self, status: &str) -> PaymentOutcome {
        match self {
            StatusVocabulary::QiwiBill => match status {
                "paid" => PaymentOutcome::Paid,
                "waiting" => PaymentOutcome::InProgress,
                "rejected" | "unpaid" | "expired" => PaymentOutcome::Declined,
                _ => PaymentOutcome::Error,
            },
            StatusVocabulary::PayMasterTransaction => match status {
                "complete" => PaymentOutcome::Paid,
                "in_progress" => PaymentOutcome::InProgress,
                "failure" => PaymentOutcome::Declined,
                _ => PaymentOutcome::Error,
            },
            StatusVocabulary::PayMasterNotification => PaymentOutcome::Paid,
        }
    }

    fn is_error_free(&self, error_code: &str) -> bool {
        match self {
            // QIWI always sends `error`; only an explicit zero is success.
            StatusVocabulary::QiwiBill => error_code == "0",
            _ => error_code.is_empty() || error_code == "0",
        }
    }
}

/// What the payment record expects and what the provider reported.
#[derive(Debug, Clone, Copy)]
pub struct Settlement<'a> {
    pub expected_amount: &'a str,
    pub expected_currency: &'a str,
    pub actual_amount: &'a str,
    pub actual_currency: &'a str,
}

impl Settlement<'_> {
    /// Checks amount and currency as exact decimals and exact ISO codes.
    pub fn verify(&self) -> Result<(), BillingError> {
        let expected = Amount::parse("expected_amount", self.expected_amount)
            .map_err(|e| BillingError::integrity(format!("unreadable expected amount: {}", e)))?;
        let actual = Amount::parse("amount", self.actual_amount)
            .map_err(|e| BillingError::integrity(format!("unreadable reported amount: {}", e)))?;

        if expected != actual {
            return Err(BillingError::integrity(format!(
                "amount mismatch: expected {}, got {}",
                expected, actual
            )));
        }
        if self.expected_currency.is_empty() || self.expected_currency != self.actual_currency {
            return Err(BillingError::integrity(format!(
                "currency mismatch: expected '{}', got '{}'",
                self.expected_currency, self.actual_currency
            )));
        }
        Ok(())
    }
}

/// Classifies a provider status, keeping the reason for an `Error`.
///
/// `Ok(PaymentOutcome::Error)` means the status itself is unknown;
/// `Err` means the notification failed the error-code or settlement check.
pub fn classify(
    vocabulary: StatusVocabulary,
    status: &str,
    error_code: &str,
    settlement: &Settlement<'_>,
) -> Result<PaymentOutcome, BillingError> {
    if !vocabulary.is_error_free(error_code) {
        return Err(BillingError::integrity(format!(
            "provider reported error code '{}'",
            error_code
        )));
    }
    settlement.verify()?;
    Ok(vocabulary.outcome_for(status))
}

/// Maps a provider status to an outcome.
///
/// Any failed check collapses to [`PaymentOutcome::Error`].
pub fn map_status(
    vocabulary: StatusVocabulary,
    status: &str,
    error_code: &str,
    settlement: &Settlement<'_>,
) -> PaymentOutcome {
    classify(vocabulary, status, error_code, settlement).unwrap_or(PaymentOutcome::Error)
}

/// True if an `error` key appears anywhere in a decoded provider response.
pub fn has_error_field(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key("error") || map.values().any(has_error_field),
        Value::Array(items) => items.iter().any(has_error_field),
        _ => false,
    }
}
