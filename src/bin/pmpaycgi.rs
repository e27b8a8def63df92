//! paycgi payment method module.

use std::process::ExitCode;

use billmgr_plugins::application::commands::{PayCgiCommand, PayCgiCommands};
use billmgr_plugins::logging::LogSession;
use billmgr_plugins::plugin::{finish, parse_args, PluginContext};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pmpaycgi", about = "Redirect payment method module")]
struct Args {
    #[arg(long)]
    command: String,

    #[arg(long)]
    payment: Option<String>,

    #[arg(long)]
    amount: Option<String>,
}

fn main() -> ExitCode {
    let config = match PluginContext::load_config() {
        Ok(config) => config,
        Err(e) => return finish(Err(e)),
    };
    let _log = LogSession::open(&config.logging, "pmpaycgi");
    let args: Args = match parse_args() {
        Ok(args) => args,
        Err(e) => return finish(Err(e)),
    };
    tracing::info!(command = %args.command, payment = ?args.payment, amount = ?args.amount, "Command received");

    finish(PayCgiCommand::parse(&args.command).and_then(|command| PayCgiCommands.handle(command)))
}
