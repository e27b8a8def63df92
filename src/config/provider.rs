//! Provider endpoints

use serde::Deserialize;

use super::error::ValidationError;

/// PayMaster endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PayMasterConfig {
    #[serde(default = "default_paymaster_base_url")]
    pub base_url: String,
}

impl PayMasterConfig {
    /// Absolute URL of a direct-API or payment path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_http_url(&self.base_url, "PAYMASTER__BASE_URL")
    }
}

impl Default for PayMasterConfig {
    fn default() -> Self {
        Self {
            base_url: default_paymaster_base_url(),
        }
    }
}

fn default_paymaster_base_url() -> String {
    "https://paymaster.ru".to_string()
}

/// QIWI endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct QiwiConfig {
    /// Base of the pull bill API
    #[serde(default = "default_qiwi_api_base_url")]
    pub api_base_url: String,

    /// Page the customer is redirected to for payment
    #[serde(default = "default_qiwi_payment_url")]
    pub payment_url: String,
}

impl QiwiConfig {
    /// URL of one bill of a provider account.
    pub fn bill_url(&self, provider_id: &str, bill_id: &str) -> String {
        format!(
            "{}/api/v2/prv/{}/bills/{}",
            self.api_base_url.trim_end_matches('/'),
            provider_id,
            bill_id
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_http_url(&self.api_base_url, "QIWI__API_BASE_URL")?;
        require_http_url(&self.payment_url, "QIWI__PAYMENT_URL")
    }
}

impl Default for QiwiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_qiwi_api_base_url(),
            payment_url: default_qiwi_payment_url(),
        }
    }
}

fn default_qiwi_api_base_url() -> String {
    "https://qiwi.com".to_string()
}

fn default_qiwi_payment_url() -> String {
    "https://qiwi.com/order/external/main.action".to_string()
}

fn require_http_url(url: &str, name: &'static str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::InvalidUrl(name)),
    }
}
