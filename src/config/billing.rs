//! Billing core and outbound HTTP configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// How the plugins reach the billing core's control utility.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Path of the control utility
    #[serde(default = "default_mgrctl_path")]
    pub mgrctl_path: PathBuf,

    /// Manager name passed as `-m`
    #[serde(default = "default_manager")]
    pub manager: String,
}

impl BillingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mgrctl_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("BILLING__MGRCTL_PATH"));
        }
        if self.manager.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BILLING__MANAGER"));
        }
        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            mgrctl_path: default_mgrctl_path(),
            manager: default_manager(),
        }
    }
}

fn default_mgrctl_path() -> PathBuf {
    PathBuf::from("/usr/local/mgr5/sbin/mgrctl")
}

fn default_manager() -> String {
    "billmgr".to_string()
}

/// Outbound call limits shared by provider HTTP and the control utility.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("http"));
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
