//! Plugin configuration
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables carry the `BILLMGR_PLUGINS`
//! prefix and nested values are separated by double underscores. Every
//! section has defaults, so a stock installation needs no variables at all.
//!
//! # Example
//!
//! ```no_run
//! use billmgr_plugins::config::AppConfig;
//!
//! // BILLMGR_PLUGINS__BILLING__MGRCTL_PATH=/opt/mgr5/sbin/mgrctl
//! let config = AppConfig::load_validated()?;
//! println!("control utility at {}", config.billing.mgrctl_path.display());
//! # Ok::<(), billmgr_plugins::config::ConfigError>(())
//! ```

mod billing;
mod error;
mod logging;
mod provider;
mod registrar;
mod server;

pub use billing::{BillingConfig, HttpConfig};
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use provider::{PayMasterConfig, QiwiConfig};
pub use registrar::RegistrarConfig;
pub use server::ServerConfig;

use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "BILLMGR_PLUGINS";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Control utility location
    #[serde(default)]
    pub billing: BillingConfig,

    /// Outbound call timeout
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub paymaster: PayMasterConfig,

    #[serde(default)]
    pub qiwi: QiwiConfig,

    /// Per-module log files
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Webhook server listen address
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub registrar: RegistrarConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present
    /// 2. Reads environment variables with `BILLMGR_PLUGINS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// - `BILLMGR_PLUGINS__HTTP__TIMEOUT_SECS=10` -> `http.timeout_secs = 10`
    /// - `BILLMGR_PLUGINS__BILLING__MANAGER=billmgr` -> `billing.manager = billmgr`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed into its type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is unusable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.billing.validate()?;
        self.http.validate()?;
        self.paymaster.validate()?;
        self.qiwi.validate()?;
        self.logging.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "BILLMGR_PLUGINS__HTTP__TIMEOUT_SECS",
        "BILLMGR_PLUGINS__BILLING__MANAGER",
        "BILLMGR_PLUGINS__SERVER__PORT",
        "BILLMGR_PLUGINS__QIWI__API_BASE_URL",
        "BILLMGR_PLUGINS__REGISTRAR__CONNECTION_PASSWORD",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_no_variables_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.billing.manager, "billmgr");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.paymaster.base_url, "https://paymaster.ru");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("BILLMGR_PLUGINS__HTTP__TIMEOUT_SECS", "5");
        env::set_var("BILLMGR_PLUGINS__BILLING__MANAGER", "testmgr");
        env::set_var("BILLMGR_PLUGINS__REGISTRAR__CONNECTION_PASSWORD", "s3cret");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.billing.manager, "testmgr");
        assert_eq!(config.registrar.connection_password(), "s3cret");
    }

    #[test]
    fn test_load_validated_rejects_bad_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("BILLMGR_PLUGINS__QIWI__API_BASE_URL", "qiwi.com");
        let result = AppConfig::load_validated();
        clear_env();

        assert!(matches!(
            result,
            Err(ConfigError::ValidationFailed(ValidationError::InvalidUrl(_)))
        ));
    }

    #[test]
    fn test_unparsable_port_is_load_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("BILLMGR_PLUGINS__SERVER__PORT", "eighty");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
