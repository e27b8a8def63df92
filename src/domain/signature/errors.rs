//! Signature verification failures.

use thiserror::Error;

use crate::domain::foundation::BillingError;

/// Why a signed payload or callback was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No signature was presented.
    #[error("empty signature")]
    MissingSignature,

    /// No authorization header was presented.
    #[error("empty authorization")]
    MissingAuthorization,

    /// The authorization header does not carry the expected credentials.
    #[error("bad auth info")]
    BadAuthorization,

    /// The signature does not match the payload.
    #[error("invalid signature")]
    Mismatch,

    /// The issue timestamp is older than the allowed window.
    #[error("signature expired ({age_secs} seconds old)")]
    Expired { age_secs: i64 },

    /// The issue timestamp lies further in the future than the allowed skew.
    #[error("signature issued in the future ({ahead_secs} seconds ahead)")]
    FromFuture { ahead_secs: i64 },

    /// The payload could not be interpreted (e.g. non-numeric `iat`).
    #[error("malformed signed payload: {0}")]
    Malformed(String),
}

impl From<SignatureError> for BillingError {
    fn from(err: SignatureError) -> Self {
        BillingError::Authentication(err.to_string())
    }
}
