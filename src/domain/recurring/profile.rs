//! Recurring profile as decoded from `payment.recurring.info`.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use super::{IssuedToken, RecurringProfileStatus};
use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::PaymentRecord;

/// A stored payment method or auto-recharge agreement.
pub struct RecurringProfile {
    pub id: ElId,
    pub token: Option<SecretString>,
    /// Token expiry as stored by the core (`YYYY-MM-DD`).
    pub token_expiry: Option<String>,
    /// Opaque provider account reference (masked card, wallet id).
    pub owner_account_ref: Option<String>,
    pub status: RecurringProfileStatus,
}

impl RecurringProfile {
    pub fn new(id: ElId, status: RecurringProfileStatus) -> Self {
        Self {
            id,
            token: None,
            token_expiry: None,
            owner_account_ref: None,
            status,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::new(token.into()));
        self
    }

    /// The stored token, required for charge and revoke.
    pub fn require_token(&self) -> Result<&str, BillingError> {
        self.token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BillingError::missing("token"))
    }
}

impl Clone for RecurringProfile {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            token: self
                .token
                .as_ref()
                .map(|t| SecretString::new(t.expose_secret().clone())),
            token_expiry: self.token_expiry.clone(),
            owner_account_ref: self.owner_account_ref.clone(),
            status: self.status,
        }
    }
}

impl fmt::Debug for RecurringProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecurringProfile")
            .field("id", &self.id)
            .field("has_token", &self.token.is_some())
            .field("token_expiry", &self.token_expiry)
            .field("owner_account_ref", &self.owner_account_ref)
            .field("status", &self.status)
            .finish()
    }
}

/// A profile together with the payment that set it up.
///
/// The payment carries the merchant id, currency and secrets the provider
/// calls are signed with.
#[derive(Debug, Clone)]
pub struct RecurringInfo {
    pub profile: RecurringProfile,
    pub payment: PaymentRecord,
    /// Monthly limit (`maxamount`); `"0"` when unset.
    pub max_amount: String,
}

impl RecurringInfo {
    /// `limits[ISO]` value for the authorization request.
    pub fn limits(&self) -> String {
        let limit = if self.max_amount.trim().is_empty() {
            "0"
        } else {
            self.max_amount.trim()
        };
        format!("{0};{0};{0}", limit)
    }
}

/// Status change for a profile, optionally with a freshly issued token.
///
/// The status decides the billing core command: saved-card statuses go
/// through `stored_method.save`, autopayment statuses through
/// `payment.recurring.saveinfo`.
#[derive(Debug)]
pub struct ProfileUpdate {
    pub status: RecurringProfileStatus,
    pub token: Option<IssuedToken>,
}

impl ProfileUpdate {
    pub fn status_only(status: RecurringProfileStatus) -> Self {
        Self {
            status,
            token: None,
        }
    }

    pub fn with_token(status: RecurringProfileStatus, token: IssuedToken) -> Self {
        Self {
            status,
            token: Some(token),
        }
    }
}
