//! PayMaster direct-API signatures.
//!
//! Every request to the direct API (token exchange, charge, status lookup)
//! carries `iat` and `sign`:
//!
//! ```text
//! sign = base64( sha256( http_build_query(params) + ";" + iat + ";" + secret ) )
//! ```
//!
//! `params` are the request fields in insertion order, before `iat` and
//! `sign` are appended. The digest is base64-encoded raw bytes, not hex.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::{constant_time_eq, OrderedParams, SignatureError};

/// Field carrying the issue timestamp.
pub const ISSUED_AT_FIELD: &str = "iat";

/// Field carrying the signature.
pub const SIGN_FIELD: &str = "sign";

/// Accepted clock difference between signer and verifier, in seconds.
pub const DEFAULT_MAX_SKEW_SECS: i64 = 300;

/// Signs and verifies direct-API payloads with a shared secret.
pub struct DirectSigner {
    secret: SecretString,
}

impl DirectSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Computes the signature of `params` issued at `issued_at` (unix seconds).
    pub fn sign(&self, params: &OrderedParams, issued_at: i64) -> String {
        let canonical = format!(
            "{};{};{}",
            params.to_query_string(),
            issued_at,
            self.secret.expose_secret()
        );
        BASE64_STANDARD.encode(Sha256::digest(canonical.as_bytes()))
    }

    /// Returns `params` with `iat` and `sign` appended, ready to post.
    pub fn sign_payload(&self, mut params: OrderedParams, issued_at: i64) -> OrderedParams {
        let sign = self.sign(&params, issued_at);
        params.insert(ISSUED_AT_FIELD, issued_at.to_string());
        params.insert(SIGN_FIELD, sign);
        params
    }

    /// Verifies `provided` against `params` and checks the issue window.
    ///
    /// The window is symmetric: `|now - issued_at|` must not exceed
    /// `max_skew_secs`.
    pub fn verify(
        &self,
        params: &OrderedParams,
        provided: &str,
        issued_at: i64,
        now: i64,
        max_skew_secs: i64,
    ) -> Result<(), SignatureError> {
        if provided.is_empty() {
            return Err(SignatureError::MissingSignature);
        }

        let age = now - issued_at;
        if age > max_skew_secs {
            return Err(SignatureError::Expired { age_secs: age });
        }
        if age < -max_skew_secs {
            return Err(SignatureError::FromFuture { ahead_secs: -age });
        }

        let expected = self.sign(params, issued_at);
        if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            return Err(SignatureError::Mismatch);
        }
        Ok(())
    }

    /// Verifies a full payload as produced by [`DirectSigner::sign_payload`].
    pub fn verify_payload(
        &self,
        payload: &OrderedParams,
        now: i64,
        max_skew_secs: i64,
    ) -> Result<(), SignatureError> {
        let mut params = payload.clone();
        let provided = params.remove(SIGN_FIELD).unwrap_or_default();
        let issued_at = params
            .remove(ISSUED_AT_FIELD)
            .ok_or_else(|| SignatureError::Malformed("missing iat".to_string()))?;
        let issued_at: i64 = issued_at
            .parse()
            .map_err(|_| SignatureError::Malformed(format!("non-numeric iat '{}'", issued_at)))?;

        self.verify(&params, &provided, issued_at, now, max_skew_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "direct_secret_123";
    const NOW: i64 = 1_700_000_000;

    fn token_request() -> OrderedParams {
        OrderedParams::new()
            .with("code", "auth-code")
            .with("client_id", "merchant-1")
            .with("grant_type", "authorization_code")
            .with("type", "rest")
    }

    // ══════════════════════════════════════════════════════════════
    // Signing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn sign_is_base64_of_raw_sha256_digest() {
        let signer = DirectSigner::new(SECRET);
        let params = OrderedParams::new().with("a", "1");

        let canonical = format!("a=1;{};{}", NOW, SECRET);
        let expected = BASE64_STANDARD.encode(Sha256::digest(canonical.as_bytes()));

        assert_eq!(signer.sign(&params, NOW), expected);
        // 32-byte digest is 44 base64 characters
        assert_eq!(expected.len(), 44);
    }

    #[test]
    fn sign_depends_on_parameter_order() {
        let signer = DirectSigner::new(SECRET);
        let forward = OrderedParams::new().with("a", "1").with("b", "2");
        let reversed = OrderedParams::new().with("b", "2").with("a", "1");

        assert_ne!(signer.sign(&forward, NOW), signer.sign(&reversed, NOW));
    }

    #[test]
    fn sign_payload_appends_iat_then_sign() {
        let signer = DirectSigner::new(SECRET);
        let payload = signer.sign_payload(token_request(), NOW);

        let keys: Vec<&str> = payload.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["code", "client_id", "grant_type", "type", "iat", "sign"]
        );
        assert_eq!(payload.get("iat"), Some("1700000000"));
        assert_eq!(payload.get("sign").unwrap(), signer.sign(&token_request(), NOW));
    }

    // ══════════════════════════════════════════════════════════════
    // Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_accepts_own_signature() {
        let signer = DirectSigner::new(SECRET);
        let sign = signer.sign(&token_request(), NOW);
        assert!(signer.verify(&token_request(), &sign, NOW, NOW, DEFAULT_MAX_SKEW_SECS).is_ok());
    }

    #[test]
    fn verify_rejects_empty_signature() {
        let signer = DirectSigner::new(SECRET);
        let result = signer.verify(&token_request(), "", NOW, NOW, DEFAULT_MAX_SKEW_SECS);
        assert_eq!(result, Err(SignatureError::MissingSignature));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let sign = DirectSigner::new("other").sign(&token_request(), NOW);
        let result = DirectSigner::new(SECRET).verify(&token_request(), &sign, NOW, NOW, DEFAULT_MAX_SKEW_SECS);
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn verify_rejects_stale_issue_time() {
        let signer = DirectSigner::new(SECRET);
        let issued = NOW - 301;
        let sign = signer.sign(&token_request(), issued);
        let result = signer.verify(&token_request(), &sign, issued, NOW, DEFAULT_MAX_SKEW_SECS);
        assert_eq!(result, Err(SignatureError::Expired { age_secs: 301 }));
    }

    #[test]
    fn verify_accepts_issue_time_at_window_boundary() {
        let signer = DirectSigner::new(SECRET);
        let issued = NOW - 300;
        let sign = signer.sign(&token_request(), issued);
        assert!(signer.verify(&token_request(), &sign, issued, NOW, DEFAULT_MAX_SKEW_SECS).is_ok());
    }

    #[test]
    fn verify_rejects_future_issue_time_beyond_skew() {
        let signer = DirectSigner::new(SECRET);
        let issued = NOW + 600;
        let sign = signer.sign(&token_request(), issued);
        let result = signer.verify(&token_request(), &sign, issued, NOW, DEFAULT_MAX_SKEW_SECS);
        assert_eq!(result, Err(SignatureError::FromFuture { ahead_secs: 600 }));
    }

    #[test]
    fn verify_payload_round_trips_sign_payload() {
        let signer = DirectSigner::new(SECRET);
        let payload = signer.sign_payload(token_request(), NOW);
        assert!(signer.verify_payload(&payload, NOW + 10, DEFAULT_MAX_SKEW_SECS).is_ok());
    }

    #[test]
    fn verify_payload_requires_numeric_iat() {
        let signer = DirectSigner::new(SECRET);
        let payload = token_request().with("iat", "yesterday").with("sign", "x");
        assert!(matches!(
            signer.verify_payload(&payload, NOW, DEFAULT_MAX_SKEW_SECS),
            Err(SignatureError::Malformed(_))
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Properties
    // ══════════════════════════════════════════════════════════════

    fn params_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("[a-z_]{1,8}", "[ -~]{0,16}"), 1..6)
    }

    proptest! {
        #[test]
        fn signature_round_trips(pairs in params_strategy(), secret in "[ -~]{1,24}", iat in 0i64..4_000_000_000) {
            let params: OrderedParams = pairs.into_iter().collect();
            let signer = DirectSigner::new(secret);
            let sign = signer.sign(&params, iat);
            prop_assert!(signer.verify(&params, &sign, iat, iat, DEFAULT_MAX_SKEW_SECS).is_ok());
        }

        #[test]
        fn flipping_any_value_breaks_the_signature(
            pairs in params_strategy(),
            index in any::<prop::sample::Index>(),
            iat in 0i64..4_000_000_000,
        ) {
            let params: OrderedParams = pairs.into_iter().collect();
            let signer = DirectSigner::new(SECRET);
            let sign = signer.sign(&params, iat);

            let victim = index.get(&params.clone().into_pairs()).0.clone();
            let mut tampered = params.clone();
            let flipped = format!("{}x", tampered.get_or_empty(&victim));
            tampered.insert(victim, flipped);

            prop_assert_eq!(
                signer.verify(&tampered, &sign, iat, iat, DEFAULT_MAX_SKEW_SECS),
                Err(SignatureError::Mismatch)
            );
        }
    }
}
