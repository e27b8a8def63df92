//! PayMaster payment method module.

use std::process::ExitCode;
use std::sync::Arc;

use billmgr_plugins::application::commands::{PayMasterCommand, PayMasterCommands};
use billmgr_plugins::logging::LogSession;
use billmgr_plugins::plugin::{block_on, finish, parse_args, PluginContext};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pmpaymaster", about = "PayMaster payment method module")]
struct Args {
    #[arg(long)]
    command: String,

    #[arg(long)]
    payment: Option<String>,

    #[arg(long)]
    recurring: Option<String>,

    /// Logged only; the payment record is authoritative
    #[arg(long)]
    amount: Option<String>,
}

fn main() -> ExitCode {
    let config = match PluginContext::load_config() {
        Ok(config) => config,
        Err(e) => return finish(Err(e)),
    };
    let _log = LogSession::open(&config.logging, "pmpaymaster");
    let args: Args = match parse_args() {
        Ok(args) => args,
        Err(e) => return finish(Err(e)),
    };
    tracing::info!(
        command = %args.command,
        payment = ?args.payment,
        recurring = ?args.recurring,
        amount = ?args.amount,
        "Command received"
    );

    let outcome = PayMasterCommand::parse(&args.command, args.payment.as_deref(), args.recurring.as_deref())
        .and_then(|command| {
            let context = PluginContext::production(config)?;
            let commands = PayMasterCommands::new(Arc::new(context.token_lifecycle()));
            block_on(commands.handle(command))
        });
    finish(outcome)
}
