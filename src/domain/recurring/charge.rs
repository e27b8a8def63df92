//! Replies of the direct payment endpoints used to charge a stored token.

use serde_json::Value;

use super::token::scalar_text;
use crate::domain::foundation::BillingError;
use crate::domain::payment::{has_error_field, PaymentOutcome, StatusVocabulary};

/// Reply of `/direct/payment/init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeInit {
    Accepted { processor_transaction_id: String },
    Refused { error: String },
}

impl ChargeInit {
    pub fn parse(body: &str) -> Result<Self, BillingError> {
        let json = parse_json(body, "payment init")?;
        if has_error_field(&json) {
            let error = json
                .get("error")
                .map(scalar_text)
                .unwrap_or_else(|| "error".to_string());
            return Ok(ChargeInit::Refused { error });
        }

        let processor_transaction_id = json
            .get("processor_transaction_id")
            .map(scalar_text)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                BillingError::provider("payment init response has no processor_transaction_id")
            })?;
        Ok(ChargeInit::Accepted {
            processor_transaction_id,
        })
    }
}

/// Reply of `/direct/payment/complete`, the authority on a charge's fate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStatus {
    pub status: String,
}

impl TransactionStatus {
    pub fn parse(body: &str) -> Result<Self, BillingError> {
        let json = parse_json(body, "payment status")?;
        if has_error_field(&json) {
            return Ok(Self {
                status: String::new(),
            });
        }
        let status = json.get("status").map(scalar_text).unwrap_or_default();
        Ok(Self { status })
    }

    pub fn outcome(&self) -> PaymentOutcome {
        StatusVocabulary::PayMasterTransaction.outcome_for(&self.status)
    }
}

fn parse_json(body: &str, what: &str) -> Result<Value, BillingError> {
    serde_json::from_str(body)
        .map_err(|e| BillingError::provider(format!("{} response is not JSON: {}", what, e)))
}
