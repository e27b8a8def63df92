//! `pmpaymaster` commands.

use std::sync::Arc;

use crate::application::recurring::TokenLifecycleManager;
use crate::domain::foundation::{BillingError, ElId};

use super::{CommandOutput, PaymethodConfig};

/// Recurring type bits: a monthly maximum amount is required.
const RT_MAX_AMOUNT: u32 = 8;
/// Confirmation needs a redirect.
const RT_REDIRECT: u32 = 20;
/// The token is obtained separately from any payment.
const RT_NEED_INIT: u32 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayMasterCommand {
    Config,
    /// Charge a payment against its stored token.
    RcPay { payment: ElId },
    /// Revoke a stored token.
    RcDelete { recurring: ElId },
    /// Nothing to set up; payments are created on the payment page.
    CrSet,
}

impl PayMasterCommand {
    pub fn parse(
        command: &str,
        payment: Option<&str>,
        recurring: Option<&str>,
    ) -> Result<Self, BillingError> {
        match command {
            "config" => Ok(PayMasterCommand::Config),
            "rcpay" => Ok(PayMasterCommand::RcPay {
                payment: required_id("payment", payment)?,
            }),
            "rcdelete" => Ok(PayMasterCommand::RcDelete {
                recurring: required_id("recurring", recurring)?,
            }),
            "crset" => Ok(PayMasterCommand::CrSet),
            other => Err(BillingError::UnknownCommand(other.to_string())),
        }
    }
}

pub(super) fn required_id(flag: &str, raw: Option<&str>) -> Result<ElId, BillingError> {
    ElId::parse(flag, raw.ok_or_else(|| BillingError::missing(flag))?)
}

/// Runs PayMaster commands through the token lifecycle.
pub struct PayMasterCommands {
    tokens: Arc<TokenLifecycleManager>,
}

impl PayMasterCommands {
    pub fn new(tokens: Arc<TokenLifecycleManager>) -> Self {
        Self { tokens }
    }

    pub async fn handle(&self, command: PayMasterCommand) -> Result<CommandOutput, BillingError> {
        match command {
            PayMasterCommand::Config => Ok(CommandOutput::Document(config().to_node())),
            PayMasterCommand::RcPay { payment } => {
                let outcome = self.tokens.charge(&payment).await?;
                tracing::info!(elid = %payment, outcome = ?outcome, "Recurring charge finished");
                Ok(CommandOutput::Silent)
            }
            PayMasterCommand::RcDelete { recurring } => {
                self.tokens.revoke(&recurring).await?;
                Ok(CommandOutput::Silent)
            }
            PayMasterCommand::CrSet => Ok(CommandOutput::Silent),
        }
    }
}

fn config() -> PaymethodConfig {
    let recurring_type = (1u32 << RT_REDIRECT) + (1 << RT_NEED_INIT) + (1 << RT_MAX_AMOUNT);
    PaymethodConfig::new()
        .feature("redirect")
        .feature("notneedprofile")
        .feature("crset")
        .feature("recurring")
        .feature("stored")
        .feature("rcpay")
        .feature("rcdelete")
        .param("payment_script", "/mancgi/paymasterpayment")
        .param("recurring_script", "/mancgi/paymasterrecurring")
        .param("recurring_type", recurring_type.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBillingCore, ScriptedProviderHttp};
    use crate::config::PayMasterConfig;
    use crate::ports::SystemClock;

    fn commands() -> PayMasterCommands {
        PayMasterCommands::new(Arc::new(TokenLifecycleManager::new(
            Arc::new(InMemoryBillingCore::new()),
            Arc::new(ScriptedProviderHttp::new()),
            Arc::new(SystemClock),
            PayMasterConfig::default(),
        )))
    }

    // ══════════════════════════════════════════════════════════════
    // Parsing
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn rcpay_requires_payment() {
        assert_eq!(
            PayMasterCommand::parse("rcpay", None, None),
            Err(BillingError::missing("payment"))
        );
        assert_eq!(
            PayMasterCommand::parse("rcpay", Some("42"), None).unwrap(),
            PayMasterCommand::RcPay {
                payment: ElId::parse("payment", "42").unwrap()
            }
        );
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(
            PayMasterCommand::parse("refund", None, None),
            Err(BillingError::UnknownCommand("refund".to_string()))
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Config
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn config_advertises_recurring_features() {
        let rendered = commands()
            .handle(PayMasterCommand::Config)
            .await
            .unwrap()
            .render();

        for feature in ["redirect", "notneedprofile", "crset", "recurring", "stored", "rcpay", "rcdelete"] {
            assert!(rendered.contains(&format!("<{0}>on</{0}>", feature)), "{}", feature);
        }
        assert!(rendered.contains("<recurring_script>/mancgi/paymasterrecurring</recurring_script>"));
        assert!(rendered.contains("<recurring_type>17826048</recurring_type>"));
    }

    #[tokio::test]
    async fn crset_is_a_no_op() {
        assert_eq!(
            commands().handle(PayMasterCommand::CrSet).await.unwrap(),
            CommandOutput::Silent
        );
    }
}
