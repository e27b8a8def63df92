//! Registrar module configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Settings of the registrar processing module.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrarConfig {
    /// Password a processing module connection must carry
    #[serde(default = "default_connection_password")]
    pub connection_password: SecretString,
}

impl RegistrarConfig {
    pub fn connection_password(&self) -> &str {
        self.connection_password.expose_secret()
    }
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            connection_password: default_connection_password(),
        }
    }
}

fn default_connection_password() -> SecretString {
    SecretString::new("test".to_string())
}
