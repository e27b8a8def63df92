//! CLI commands the billing daemon runs with `--command=<name>`.
//!
//! Every command answers with an XML document on stdout. Errors are not
//! rendered here; the binary renders the returned [`BillingError`] once.

mod paycgi;
mod paymaster;
mod paymethod_config;
mod qiwi;
mod registrar;

pub use paycgi::{PayCgiCommand, PayCgiCommands};
pub use paymaster::{PayMasterCommand, PayMasterCommands};
pub use paymethod_config::PaymethodConfig;
pub use qiwi::{QiwiCommand, QiwiCommands};
pub use registrar::{RegistrarArgs, RegistrarCommand, RegistrarModule};

use crate::adapters::xml::{ErrorDocument, XmlNode};
use crate::domain::foundation::BillingError;

/// What a successful command prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Document(XmlNode),
    /// The daemon reads nothing back; state changes went through the core.
    Silent,
}

impl CommandOutput {
    /// The empty `<doc/>`.
    pub fn ok() -> Self {
        CommandOutput::Document(XmlNode::doc())
    }

    pub fn render(&self) -> String {
        match self {
            CommandOutput::Document(node) => node.to_document(),
            CommandOutput::Silent => String::new(),
        }
    }
}

/// Renders a command result for stdout.
pub fn render_outcome(outcome: &Result<CommandOutput, BillingError>) -> String {
    match outcome {
        Ok(output) => output.render(),
        Err(e) => ErrorDocument::from(e).render(),
    }
}

/// Reads the form document some commands receive on stdin.
pub type FormReader<'a> = &'a mut dyn FnMut() -> Result<XmlNode, BillingError>;
