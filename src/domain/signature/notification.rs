//! QIWI pull-bill notification signatures.
//!
//! QIWI signs each notification with HMAC-SHA1 over the values of every
//! posted field, ordered by field name and joined by `|`, keyed by the
//! merchant's notification password. The base64 digest arrives in the
//! `X-Api-Signature` header. The request also carries
//! `Authorization: Basic base64(PRV_ID:NOTIFY_PASSWORD)`.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

use super::{constant_time_eq, OrderedParams, SignatureError};

type HmacSha1 = Hmac<Sha1>;

/// Signs and verifies QIWI notifications for one merchant.
pub struct NotificationSigner {
    provider_id: String,
    password: SecretString,
}

impl NotificationSigner {
    pub fn new(provider_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Computes the `X-Api-Signature` value for `params`.
    pub fn sign(&self, params: &OrderedParams) -> String {
        let canonical = params.values_sorted_by_key().join("|");
        let mut mac = HmacSha1::new_from_slice(self.password.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        BASE64_STANDARD.encode(mac.finalize().into_bytes())
    }

    /// The `Authorization` header value QIWI is expected to send.
    pub fn expected_authorization(&self) -> String {
        let credentials = format!("{}:{}", self.provider_id, self.password.expose_secret());
        format!("Basic {}", BASE64_STANDARD.encode(credentials))
    }

    /// Checks the `Authorization` header.
    ///
    /// Only the credential part after the scheme is compared, so the scheme
    /// name is accepted in any case.
    pub fn verify_authorization(&self, header: Option<&str>) -> Result<(), SignatureError> {
        let credentials = header
            .and_then(|h| h.split_whitespace().nth(1))
            .filter(|c| !c.is_empty())
            .ok_or(SignatureError::MissingAuthorization)?;

        let expected = self.expected_authorization();
        let expected_credentials = expected.trim_start_matches("Basic ");
        if !constant_time_eq(expected_credentials.as_bytes(), credentials.as_bytes()) {
            return Err(SignatureError::BadAuthorization);
        }
        Ok(())
    }

    /// Checks the `X-Api-Signature` header against `params`.
    pub fn verify(&self, params: &OrderedParams, header: Option<&str>) -> Result<(), SignatureError> {
        let provided = header
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SignatureError::MissingSignature)?;

        let expected = self.sign(params);
        if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            return Err(SignatureError::Mismatch);
        }
        Ok(())
    }
}
