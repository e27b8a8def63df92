//! Error types shared by every plugin.
//!
//! `BillingError` is the one error that crosses layer boundaries. It is
//! rendered exactly once, at the outermost boundary: as an XML `<error>`
//! document for the billing daemon, or as a provider-specific acknowledgment
//! for webhook callers.

use std::fmt;

use thiserror::Error;

/// Failure categories understood by the billing daemon and the callback fronts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// A required input field is missing or malformed.
    #[error("Invalid value for '{field}': {reason}")]
    Validation {
        field: String,
        value: Option<String>,
        reason: String,
    },

    /// Missing or invalid signature / authorization header.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Amount or currency disagrees with the payment record despite a valid signature.
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// The billing core or a provider call failed.
    #[error("{service} call failed: {message}")]
    Upstream { service: Upstream, message: String },

    /// The provider refused an operation it understood.
    #[error("Payment processing error: {0}")]
    PaymentProcess(String),

    /// Per-method or per-module settings are unusable.
    #[error("Configuration error in '{field}': {reason}")]
    Configuration { field: String, reason: String },

    /// The daemon asked for a command this plugin does not implement.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Which collaborator an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    BillingCore,
    Provider,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::BillingCore => write!(f, "billing core"),
            Upstream::Provider => write!(f, "provider"),
        }
    }
}

impl BillingError {
    /// Creates a validation error for a missing field.
    pub fn missing(field: impl Into<String>) -> Self {
        BillingError::Validation {
            field: field.into(),
            value: None,
            reason: "value is required".to_string(),
        }
    }

    /// Creates a validation error carrying the rejected value.
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        BillingError::Validation {
            field: field.into(),
            value: Some(value.into()),
            reason: reason.into(),
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        BillingError::Authentication(message.into())
    }

    /// Creates an integrity error.
    pub fn integrity(message: impl Into<String>) -> Self {
        BillingError::Integrity(message.into())
    }

    /// Creates a billing core failure.
    pub fn billing_core(message: impl Into<String>) -> Self {
        BillingError::Upstream {
            service: Upstream::BillingCore,
            message: message.into(),
        }
    }

    /// Creates a provider failure.
    pub fn provider(message: impl Into<String>) -> Self {
        BillingError::Upstream {
            service: Upstream::Provider,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BillingError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable `type` attribute of the rendered `<error>` element.
    pub fn error_type(&self) -> &'static str {
        match self {
            BillingError::Validation { .. } => "value",
            BillingError::Authentication(_) => "auth",
            BillingError::Integrity(_) => "integrity",
            BillingError::Upstream { .. } => "upstream",
            BillingError::PaymentProcess(_) => "payment_process_error",
            BillingError::Configuration { .. } => "value",
            BillingError::UnknownCommand(_) => "unknown_command",
        }
    }

    /// The object the error refers to, if any (`object` attribute).
    pub fn object(&self) -> Option<&str> {
        match self {
            BillingError::Validation { field, .. } | BillingError::Configuration { field, .. } => {
                Some(field)
            }
            BillingError::UnknownCommand(command) => Some(command),
            _ => None,
        }
    }

    /// Returns true if the caller should retry the same request later.
    ///
    /// Only upstream failures are transient; everything else fails the same
    /// way on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::Upstream { .. })
    }

    /// HTTP status used when the error is returned to a webhook caller.
    ///
    /// Providers retry on 5xx, so only upstream failures map there.
    pub fn status_code(&self) -> u16 {
        match self {
            BillingError::Authentication(_) => 403,
            BillingError::Validation { .. }
            | BillingError::Integrity(_)
            | BillingError::UnknownCommand(_) => 400,
            BillingError::Upstream { .. } => 502,
            BillingError::PaymentProcess(_) | BillingError::Configuration { .. } => 500,
        }
    }
}
