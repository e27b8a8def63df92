//! `pmpaycgi`: a redirect method whose payment page lives outside the plugins.

use crate::domain::foundation::BillingError;

use super::{CommandOutput, PaymethodConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayCgiCommand {
    Config,
}

impl PayCgiCommand {
    pub fn parse(command: &str) -> Result<Self, BillingError> {
        match command {
            "config" => Ok(PayCgiCommand::Config),
            other => Err(BillingError::UnknownCommand(other.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct PayCgiCommands;

impl PayCgiCommands {
    pub fn handle(&self, command: PayCgiCommand) -> Result<CommandOutput, BillingError> {
        match command {
            PayCgiCommand::Config => Ok(CommandOutput::Document(
                PaymethodConfig::new()
                    .feature("redirect")
                    .feature("notneedprofile")
                    .param("payment_script", "/mancgi/paycgipayment")
                    .to_node(),
            )),
        }
    }
}
