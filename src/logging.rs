//! Per-invocation logging.
//!
//! Every CLI or CGI run opens a [`LogSession`] that appends to
//! `<dir>/<module>.log` for exactly as long as the session value lives. The
//! subscriber is installed with `set_default`, so it is removed on every
//! exit path when the session is dropped.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// An open log for one plugin invocation.
pub struct LogSession {
    module: String,
    _guard: DefaultGuard,
}

impl LogSession {
    /// Starts logging for `module`.
    ///
    /// Falls back to stderr when the log file cannot be opened; a plugin
    /// never fails because its log is unwritable.
    pub fn open(config: &LoggingConfig, module: &str) -> Self {
        let path = config.log_file(module);
        let writer = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
            Err(e) => {
                eprintln!("cannot open log {}: {}", path.display(), e);
                BoxMakeWriter::new(std::io::stderr)
            }
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter(config))
            .with_ansi(false)
            .with_writer(writer)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);

        tracing::info!(module, pid = std::process::id(), "Invocation started");
        Self {
            module: module.to_string(),
            _guard: guard,
        }
    }
}

impl Drop for LogSession {
    fn drop(&mut self) {
        tracing::info!(module = %self.module, "Invocation finished");
    }
}

/// Installs a process-wide stdout subscriber for the long-running server.
pub fn init_stdout(config: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .try_init();
}

fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}
