//! QIWI pull bill payment method module.

use std::process::ExitCode;

use billmgr_plugins::application::commands::{QiwiCommand, QiwiCommands};
use billmgr_plugins::logging::LogSession;
use billmgr_plugins::plugin::{block_on, finish, parse_args, read_stdin_form, PluginContext};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pmqiwipull", about = "QIWI pull bill payment method module")]
struct Args {
    #[arg(long)]
    command: String,

    #[arg(long)]
    payment: Option<String>,

    /// Logged only; the payment record is authoritative
    #[arg(long)]
    amount: Option<String>,
}

fn main() -> ExitCode {
    let config = match PluginContext::load_config() {
        Ok(config) => config,
        Err(e) => return finish(Err(e)),
    };
    let _log = LogSession::open(&config.logging, "pmqiwipull");
    let args: Args = match parse_args() {
        Ok(args) => args,
        Err(e) => return finish(Err(e)),
    };
    tracing::info!(command = %args.command, payment = ?args.payment, amount = ?args.amount, "Command received");

    let outcome = QiwiCommand::parse(&args.command, args.payment.as_deref(), &mut read_stdin_form)
        .and_then(|command| {
            let context = PluginContext::production(config)?;
            let commands = QiwiCommands::new(
                context.core.clone(),
                context.http.clone(),
                context.clock.clone(),
                context.config.qiwi.clone(),
            );
            block_on(commands.handle(command))
        });
    finish(outcome)
}
