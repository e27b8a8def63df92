//! Payment record as decoded from `payment.info`.

use std::collections::BTreeMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::{BillingError, ElId};

/// Payment method settings that are credentials rather than plain options.
pub const SECRET_SETTINGS: [&str; 5] = [
    "secret",
    "direct_secret",
    "NOTIFY_PASSWORD",
    "API_PASSWORD",
    "password",
];

/// Per-method settings configured in the billing core.
///
/// Credential settings are held as [`SecretString`] and never appear in
/// `Debug` output.
#[derive(Default)]
pub struct MethodConfig {
    values: BTreeMap<String, String>,
    secrets: BTreeMap<String, SecretString>,
}

impl MethodConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if SECRET_SETTINGS.contains(&name.as_str()) {
            self.secrets.insert(name, SecretString::new(value.into()));
        } else {
            self.values.insert(name, value.into());
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// A plain setting, `None` if absent or empty.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// A plain setting the operation cannot proceed without.
    pub fn require(&self, name: &str) -> Result<&str, BillingError> {
        self.value(name)
            .ok_or_else(|| BillingError::configuration(name, "not set for the payment method"))
    }

    /// A credential setting the operation cannot proceed without.
    pub fn secret(&self, name: &str) -> Result<&str, BillingError> {
        self.secrets
            .get(name)
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BillingError::configuration(name, "not set for the payment method"))
    }
}

impl Clone for MethodConfig {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            secrets: self
                .secrets
                .iter()
                .map(|(k, v)| (k.clone(), SecretString::new(v.expose_secret().clone())))
                .collect(),
        }
    }
}

impl fmt::Debug for MethodConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodConfig")
            .field("values", &self.values)
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A payment owned by the billing core.
///
/// Read-only here: state changes are requested through
/// [`PaymentTransition`](super::PaymentTransition) commands.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub id: ElId,
    /// Amount in the payment method's currency (`paymethodamount`), as sent.
    pub amount: String,
    /// ISO code of the payment method's currency.
    pub currency: String,
    pub method: MethodConfig,
    pub status: Option<String>,
    pub manager_url: Option<String>,
    pub description: Option<String>,
    pub number: Option<String>,
    pub phone: Option<String>,
    pub project_name: Option<String>,
    /// Recurring profile the payment is charged against.
    pub recurring: Option<ElId>,
}

impl PaymentRecord {
    pub fn new(id: ElId, amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            id,
            amount: amount.into(),
            currency: currency.into(),
            method: MethodConfig::new(),
            status: None,
            manager_url: None,
            description: None,
            number: None,
            phone: None,
            project_name: None,
            recurring: None,
        }
    }

    pub fn with_method(mut self, method: MethodConfig) -> Self {
        self.method = method;
        self
    }

    pub fn require_manager_url(&self) -> Result<&str, BillingError> {
        self.manager_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| BillingError::configuration("manager_url", "payment has no manager url"))
    }
}
