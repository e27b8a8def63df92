//! Domain registrar processing module.

use std::process::ExitCode;

use billmgr_plugins::application::commands::{RegistrarArgs, RegistrarModule};
use billmgr_plugins::domain::foundation::BillingError;
use billmgr_plugins::logging::LogSession;
use billmgr_plugins::plugin::{block_on, finish, parse_args, read_stdin_form, PluginContext};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pmregistrar", about = "Domain registrar processing module")]
struct Args {
    #[arg(long)]
    command: String,
    #[arg(long)]
    subcommand: Option<String>,
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    item: Option<String>,
    #[arg(long)]
    lang: Option<String>,
    #[arg(long)]
    module: Option<String>,
    #[arg(long)]
    itemtype: Option<String>,
    #[arg(long)]
    intname: Option<String>,
    #[arg(long)]
    param: Option<String>,
    #[arg(long)]
    value: Option<String>,
    #[arg(long)]
    runningoperation: Option<String>,
    #[arg(long)]
    level: Option<String>,
    #[arg(long)]
    addon: Option<String>,
    #[arg(long)]
    tld: Option<String>,
    #[arg(long)]
    searchstring: Option<String>,
}

impl Args {
    fn registrar_args(&self) -> Result<RegistrarArgs, BillingError> {
        Ok(RegistrarArgs {
            item: RegistrarArgs::id_flag("item", self.item.as_deref())?,
            runningoperation: RegistrarArgs::id_flag("runningoperation", self.runningoperation.as_deref())?,
            subcommand: self.subcommand.clone(),
            id: self.id.clone(),
            lang: self.lang.clone(),
            module: self.module.clone(),
            itemtype: self.itemtype.clone(),
            intname: self.intname.clone(),
            param: self.param.clone(),
            value: self.value.clone(),
            level: self.level.clone(),
            addon: self.addon.clone(),
            tld: self.tld.clone(),
            searchstring: self.searchstring.clone(),
        })
    }
}

fn main() -> ExitCode {
    let config = match PluginContext::load_config() {
        Ok(config) => config,
        Err(e) => return finish(Err(e)),
    };
    let _log = LogSession::open(&config.logging, "pmregistrar");
    let args: Args = match parse_args() {
        Ok(args) => args,
        Err(e) => return finish(Err(e)),
    };
    tracing::info!(
        command = %args.command,
        item = ?args.item,
        runningoperation = ?args.runningoperation,
        "Command received"
    );

    let outcome = args.registrar_args().and_then(|registrar_args| {
        let context = PluginContext::production(config)?;
        let module = RegistrarModule::new(context.core.clone(), context.config.registrar.clone());
        block_on(module.run(&args.command, &registrar_args, &mut read_stdin_form))
    });
    finish(outcome)
}
