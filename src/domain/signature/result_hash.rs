//! PayMaster payment notification hash (`LMI_HASH`).

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::{constant_time_eq, OrderedParams, SignatureError};

/// Field carrying the hash in the notification.
pub const HASH_FIELD: &str = "LMI_HASH";

/// Notification fields covered by the hash, in signing order.
pub const HASHED_FIELDS: [&str; 10] = [
    "LMI_MERCHANT_ID",
    "LMI_PAYMENT_NO",
    "LMI_SYS_PAYMENT_ID",
    "LMI_SYS_PAYMENT_DATE",
    "LMI_PAYMENT_AMOUNT",
    "LMI_CURRENCY",
    "LMI_PAID_AMOUNT",
    "LMI_PAID_CURRENCY",
    "LMI_PAYMENT_SYSTEM",
    "LMI_SIM_MODE",
];

/// Computes and checks `LMI_HASH` with the payment method's secret.
pub struct ResultHash {
    secret: SecretString,
}

impl ResultHash {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Hash of the notification; absent fields contribute empty strings.
    pub fn compute(&self, params: &OrderedParams) -> String {
        let mut parts: Vec<&str> = HASHED_FIELDS
            .iter()
            .map(|field| params.get_or_empty(field))
            .collect();
        parts.push(self.secret.expose_secret());
        BASE64_STANDARD.encode(Sha256::digest(parts.join(";").as_bytes()))
    }

    pub fn verify(&self, params: &OrderedParams) -> Result<(), SignatureError> {
        let provided = params
            .get(HASH_FIELD)
            .filter(|h| !h.is_empty())
            .ok_or(SignatureError::MissingSignature)?;

        let expected = self.compute(params);
        if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            return Err(SignatureError::Mismatch);
        }
        Ok(())
    }
}
