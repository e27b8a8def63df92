//! Token lifecycle states and provider token responses.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::{AutopaymentStatus, RecurringProfileStatus, SavedCardStatus};
use crate::domain::foundation::{BillingError, StateMachine};
use crate::domain::payment::has_error_field;

/// Where a stored-payment token is in its life.
///
/// ```text
/// None -> Requesting -> Stored -> Reused* -> Revoking -> Revoked
///              |                      \_________/   |
///              v                                     v
///            Error                          (failed revoke) Stored
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenState {
    None,
    Requesting,
    Stored,
    Reused,
    Revoking,
    Revoked,
    Error,
}

impl TokenState {
    /// Token state implied by a profile's persisted status.
    pub fn of_profile(status: RecurringProfileStatus) -> Self {
        use RecurringProfileStatus::*;
        match status {
            Autopayment(AutopaymentStatus::Adding)
            | SavedCard(SavedCardStatus::Storing)
            | SavedCard(SavedCardStatus::Restoring) => TokenState::Requesting,
            Autopayment(AutopaymentStatus::Active) | SavedCard(SavedCardStatus::Stored) => {
                TokenState::Stored
            }
            Autopayment(AutopaymentStatus::Closed) | SavedCard(SavedCardStatus::Disabled) => {
                TokenState::Revoked
            }
            SavedCard(SavedCardStatus::Error) => TokenState::Error,
        }
    }
}

impl StateMachine for TokenState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TokenState::*;
        matches!(
            (self, target),
            (None, Requesting)
                | (Requesting, Stored)
                | (Requesting, Error)
                | (Stored, Reused)
                | (Stored, Revoking)
                | (Stored, Requesting)
                | (Reused, Reused)
                | (Reused, Revoking)
                | (Revoking, Revoked)
                // Revoke not confirmed; the token stays live
                | (Revoking, Stored)
                | (Error, Requesting)
                | (Revoked, Requesting)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TokenState::*;
        match self {
            None => vec![Requesting],
            Requesting => vec![Stored, Error],
            Stored => vec![Reused, Revoking, Requesting],
            Reused => vec![Reused, Revoking],
            Revoking => vec![Revoked, Stored],
            Error => vec![Requesting],
            Revoked => vec![Requesting],
        }
    }
}

/// A token issued by the provider's authorization-code exchange.
pub struct IssuedToken {
    pub access_token: SecretString,
    pub account_identifier: String,
    /// Issue time plus the provider-declared lifetime.
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Expiry as the core stores it.
    pub fn expire_date(&self) -> String {
        self.expires_at.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("account_identifier", &self.account_identifier)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Decoded reply of the token endpoint.
#[derive(Debug)]
pub enum TokenResponse {
    Issued(IssuedToken),
    /// The reply carried an `error` field somewhere.
    Rejected { error: String },
}

impl TokenResponse {
    /// Decodes a token endpoint body received at `received_at`.
    pub fn parse(body: &str, received_at: DateTime<Utc>) -> Result<Self, BillingError> {
        let json: Value = serde_json::from_str(body)
            .map_err(|e| BillingError::provider(format!("token response is not JSON: {}", e)))?;

        if has_error_field(&json) {
            let error = json
                .get("error")
                .map(scalar_text)
                .unwrap_or_else(|| "error".to_string());
            return Ok(TokenResponse::Rejected { error });
        }

        let access_token = json
            .get("access_token")
            .map(scalar_text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BillingError::provider("token response has no access_token"))?;
        let account_identifier = json
            .get("account_identifier")
            .map(scalar_text)
            .unwrap_or_default();
        let expires_in = json
            .get("expires_in")
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .ok_or_else(|| BillingError::provider("token response has no expires_in"))?;
        let expires_at = expiry(received_at, expires_in).ok_or_else(|| {
            BillingError::provider(format!("token response has unusable expires_in {}", expires_in))
        })?;

        Ok(TokenResponse::Issued(IssuedToken {
            access_token: SecretString::new(access_token),
            account_identifier,
            expires_at,
        }))
    }
}

/// `received_at + expires_in`, for a positive lifetime that stays in range.
fn expiry(received_at: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
    if expires_in <= 0 {
        return None;
    }
    received_at.checked_add_signed(Duration::try_seconds(expires_in)?)
}

/// Text of a JSON scalar; strings are unquoted.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    // ══════════════════════════════════════════════════════════════
    // State Machine
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn happy_path_lifecycle_is_valid() {
        let state = TokenState::None;
        let state = state.transition_to(TokenState::Requesting).unwrap();
        let state = state.transition_to(TokenState::Stored).unwrap();
        let state = state.transition_to(TokenState::Reused).unwrap();
        let state = state.transition_to(TokenState::Reused).unwrap();
        let state = state.transition_to(TokenState::Revoking).unwrap();
        let state = state.transition_to(TokenState::Revoked).unwrap();
        assert_eq!(state, TokenState::Revoked);
    }

    #[test]
    fn failed_revoke_returns_to_stored() {
        assert!(TokenState::Revoking.can_transition_to(&TokenState::Stored));
    }

    #[test]
    fn cannot_charge_without_stored_token() {
        assert!(TokenState::Requesting.transition_to(TokenState::Reused).is_err());
        assert!(TokenState::Revoked.transition_to(TokenState::Reused).is_err());
        assert!(TokenState::None.transition_to(TokenState::Stored).is_err());
    }

    #[test]
    fn profile_status_implies_token_state() {
        let stored = RecurringProfileStatus::SavedCard(SavedCardStatus::Stored);
        let adding = RecurringProfileStatus::Autopayment(AutopaymentStatus::Adding);
        let closed = RecurringProfileStatus::Autopayment(AutopaymentStatus::Closed);
        assert_eq!(TokenState::of_profile(stored), TokenState::Stored);
        assert_eq!(TokenState::of_profile(adding), TokenState::Requesting);
        assert_eq!(TokenState::of_profile(closed), TokenState::Revoked);
    }

    // ══════════════════════════════════════════════════════════════
    // Token Response Parsing
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn issued_token_expires_after_declared_lifetime() {
        let body = r#"{"access_token":"tok-1","account_identifier":"4111****1111","expires_in":86400}"#;
        let response = TokenResponse::parse(body, received_at()).unwrap();

        match response {
            TokenResponse::Issued(token) => {
                assert_eq!(token.token(), "tok-1");
                assert_eq!(token.account_identifier, "4111****1111");
                assert_eq!(token.expires_at, received_at() + Duration::seconds(86400));
                assert_eq!(token.expire_date(), "2024-01-16");
            }
            other => panic!("expected issued token, got {:?}", other),
        }
    }

    #[test]
    fn error_field_means_rejected() {
        let body = r#"{"error":"invalid_grant","error_description":"code expired"}"#;
        let response = TokenResponse::parse(body, received_at()).unwrap();
        assert!(matches!(response, TokenResponse::Rejected { ref error } if error == "invalid_grant"));
    }

    #[test]
    fn nested_error_field_means_rejected() {
        let body = r#"{"access_token":"t","expires_in":10,"details":{"error":1}}"#;
        let response = TokenResponse::parse(body, received_at()).unwrap();
        assert!(matches!(response, TokenResponse::Rejected { .. }));
    }

    #[test]
    fn non_json_body_is_upstream_error() {
        let err = TokenResponse::parse("<html>", received_at()).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn missing_access_token_is_upstream_error() {
        assert!(TokenResponse::parse(r#"{"expires_in":10}"#, received_at()).is_err());
    }

    #[test]
    fn out_of_range_lifetime_is_upstream_error() {
        let body = r#"{"access_token":"t","account_identifier":"a","expires_in":9223372036854775807}"#;
        let err = TokenResponse::parse(body, received_at()).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn non_positive_lifetime_is_upstream_error() {
        for expires_in in ["-86400", "0"] {
            let body = format!(r#"{{"access_token":"t","expires_in":{}}}"#, expires_in);
            assert!(TokenResponse::parse(&body, received_at()).is_err(), "{}", expires_in);
        }
    }

    #[test]
    fn debug_hides_access_token() {
        let body = r#"{"access_token":"tok-hidden","expires_in":"60"}"#;
        let response = TokenResponse::parse(body, received_at()).unwrap();
        assert!(!format!("{:?}", response).contains("tok-hidden"));
    }
}
