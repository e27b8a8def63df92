//! Log file configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where each plugin invocation appends its log.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directory holding `<module>.log` files
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_level")]
    pub level: String,
}

impl LoggingConfig {
    pub fn log_file(&self, module: &str) -> PathBuf {
        self.dir.join(format!("{}.log", module))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        tracing_subscriber::EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|_| ValidationError::InvalidLogLevel(self.level.clone()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            level: default_level(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("/usr/local/mgr5/var")
}

fn default_level() -> String {
    "debug".to_string()
}
