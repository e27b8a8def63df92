//! Process bootstrap shared by the plugin binaries.
//!
//! A plugin invocation loads configuration, wires the production adapters
//! behind the ports, runs one command on a current-thread runtime and
//! prints exactly one document.

use std::future::Future;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::error::{ContextKind, ErrorKind};
use clap::Parser;

use crate::adapters::xml::XmlNode;
use crate::adapters::{MgrctlBillingCore, ReqwestProviderClient};
use crate::application::callback::CallbackRouter;
use crate::application::commands::{render_outcome, CommandOutput};
use crate::application::recurring::TokenLifecycleManager;
use crate::config::AppConfig;
use crate::domain::foundation::BillingError;
use crate::ports::{BillingCore, Clock, ProviderHttp, SystemClock};

/// Configuration plus the ports every command works through.
pub struct PluginContext {
    pub config: AppConfig,
    pub core: Arc<dyn BillingCore>,
    pub http: Arc<dyn ProviderHttp>,
    pub clock: Arc<dyn Clock>,
}

impl PluginContext {
    /// Loads and validates configuration from the environment.
    pub fn load_config() -> Result<AppConfig, BillingError> {
        Ok(AppConfig::load_validated()?)
    }

    /// Wires the control utility and the reqwest provider client.
    pub fn production(config: AppConfig) -> Result<Self, BillingError> {
        let timeout = config.http.timeout();
        let core = MgrctlBillingCore::new(
            config.billing.mgrctl_path.clone(),
            config.billing.manager.clone(),
            timeout,
        );
        let http = ReqwestProviderClient::new(timeout)?;
        Ok(Self {
            config,
            core: Arc::new(core),
            http: Arc::new(http),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn token_lifecycle(&self) -> TokenLifecycleManager {
        TokenLifecycleManager::new(
            self.core.clone(),
            self.http.clone(),
            self.clock.clone(),
            self.config.paymaster.clone(),
        )
    }

    pub fn callback_router(&self) -> CallbackRouter {
        CallbackRouter::new(
            self.core.clone(),
            self.http.clone(),
            self.clock.clone(),
            &self.config,
        )
    }
}

/// Parses the process arguments into `A`.
///
/// The daemon passes the same option set to every module, so long flags
/// `A` does not declare are dropped rather than rejected. Usage errors
/// come back as validation errors for [`finish`] to print.
pub fn parse_args<A: Parser>() -> Result<A, BillingError> {
    parse_args_from(std::env::args())
}

/// [`parse_args`] over an explicit argument list (program name first).
pub fn parse_args_from<A, I>(args: I) -> Result<A, BillingError>
where
    A: Parser,
    I: IntoIterator<Item = String>,
{
    let command = A::command();
    let declared = |name: &str| {
        name == "help" || command.get_arguments().any(|arg| arg.get_long() == Some(name))
    };

    let mut kept = Vec::new();
    let mut args = args.into_iter().peekable();
    kept.extend(args.next());
    while let Some(arg) = args.next() {
        let (is_flag, known, inline_value) = match arg.strip_prefix("--") {
            Some(flag) => match flag.split_once('=') {
                Some((name, _)) => (true, declared(name), true),
                None => (true, declared(flag), false),
            },
            None => (false, true, false),
        };
        let separate_value = is_flag
            && !inline_value
            && args.peek().is_some_and(|next| !next.starts_with("--"));

        if known {
            kept.push(arg);
            if separate_value {
                kept.extend(args.next());
            }
        } else {
            tracing::debug!(arg = %arg, "Ignoring undeclared option");
            if separate_value {
                args.next();
            }
        }
    }

    A::try_parse_from(kept).map_err(|e| {
        if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
            e.exit();
        }
        usage_error(&e)
    })
}

fn usage_error(err: &clap::Error) -> BillingError {
    let arg = err
        .get(ContextKind::InvalidArg)
        .map(|value| value.to_string())
        .and_then(|value| value.split_whitespace().next().map(str::to_string))
        .map(|value| value.trim_start_matches('-').to_string());
    match (err.kind(), arg) {
        (ErrorKind::MissingRequiredArgument, Some(arg)) => BillingError::missing(arg),
        (_, Some(arg)) => BillingError::invalid_value(arg, "", err.kind().to_string()),
        (_, None) => BillingError::invalid_value("arguments", "", err.kind().to_string()),
    }
}

/// Runs `task` to completion on a fresh current-thread runtime.
pub fn block_on<F, T>(task: F) -> Result<T, BillingError>
where
    F: Future<Output = Result<T, BillingError>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BillingError::configuration("runtime", e.to_string()))?;
    runtime.block_on(task)
}

/// Reads the form document the daemon writes to stdin.
pub fn read_stdin_form() -> Result<XmlNode, BillingError> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| BillingError::invalid_value("stdin", "", e.to_string()))?;
    Ok(XmlNode::parse(&input)?)
}

/// Prints the command's document and maps the outcome to an exit code.
pub fn finish(outcome: Result<CommandOutput, BillingError>) -> ExitCode {
    if let Err(e) = &outcome {
        tracing::error!(error = %e, error_type = e.error_type(), "Command failed");
    }
    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout
        .write_all(render_outcome(&outcome).as_bytes())
        .and_then(|()| stdout.flush())
    {
        tracing::error!(error = %e, "Could not write command output");
        return ExitCode::FAILURE;
    }
    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser, Debug)]
    struct TestArgs {
        #[arg(long)]
        command: String,
        #[arg(long)]
        payment: Option<String>,
    }

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("pmtest")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn undeclared_flags_are_ignored() {
        let args: TestArgs =
            parse_args_from(argv(&["--lang=ru", "--command=config", "--level", "7", "--payment", "42"]))
                .unwrap();
        assert_eq!(args.command, "config");
        assert_eq!(args.payment.as_deref(), Some("42"));
    }

    #[test]
    fn missing_command_is_a_validation_error() {
        let err = parse_args_from::<TestArgs, _>(argv(&["--payment=42"])).unwrap_err();
        assert_eq!(err, BillingError::missing("command"));
    }

    #[test]
    fn usage_error_renders_as_error_document() {
        let outcome = parse_args_from::<TestArgs, _>(argv(&[])).map(|_| CommandOutput::ok());
        let document = render_outcome(&outcome);
        assert!(document.contains(r#"<error type="value" object="command"/>"#), "{}", document);
    }
}
