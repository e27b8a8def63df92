//! Maps CGI script names onto their handlers.

use std::sync::Arc;

use crate::application::recurring::TokenLifecycleManager;
use crate::application::EndpointResponse;
use crate::config::AppConfig;
use crate::domain::foundation::BillingError;
use crate::domain::payment::CallbackEnvelope;
use crate::ports::{BillingCore, Clock, ProviderHttp};

use super::{
    PayMasterResultHandler, PaymentPage, PaymentPageHandler, QiwiNotificationHandler,
    RecurringResultHandler,
};

/// A `mancgi` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    PayMasterPayment,
    PayMasterRecurring,
    PayMasterResult,
    PayMasterRecurringResult,
    QiwiPullPayment,
    QiwiPullResult,
}

impl Endpoint {
    pub const ALL: [Endpoint; 6] = [
        Endpoint::PayMasterPayment,
        Endpoint::PayMasterRecurring,
        Endpoint::PayMasterResult,
        Endpoint::PayMasterRecurringResult,
        Endpoint::QiwiPullPayment,
        Endpoint::QiwiPullResult,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::PayMasterPayment => "paymasterpayment",
            Endpoint::PayMasterRecurring => "paymasterrecurring",
            Endpoint::PayMasterResult => "paymasterresult",
            Endpoint::PayMasterRecurringResult => "paymasterrecurringresult",
            Endpoint::QiwiPullPayment => "qiwipullpayment",
            Endpoint::QiwiPullResult => "qiwipullresult",
        }
    }

    /// Resolves a script name; a trailing `.php` is accepted so existing
    /// panel links keep working.
    pub fn from_name(name: &str) -> Result<Self, BillingError> {
        let bare = name.strip_suffix(".php").unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|e| e.name() == bare)
            .ok_or_else(|| BillingError::UnknownCommand(name.to_string()))
    }
}

/// Owns one handler per endpoint, built from shared ports.
pub struct CallbackRouter {
    pages: PaymentPageHandler,
    paymaster_result: PayMasterResultHandler,
    recurring_result: RecurringResultHandler,
    qiwi: QiwiNotificationHandler,
}

impl CallbackRouter {
    pub fn new(
        core: Arc<dyn BillingCore>,
        http: Arc<dyn ProviderHttp>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> Self {
        let tokens = Arc::new(TokenLifecycleManager::new(
            core.clone(),
            http,
            clock,
            config.paymaster.clone(),
        ));
        Self {
            pages: PaymentPageHandler::new(
                core.clone(),
                tokens.clone(),
                config.paymaster.clone(),
                config.qiwi.clone(),
            ),
            paymaster_result: PayMasterResultHandler::new(core.clone()),
            recurring_result: RecurringResultHandler::new(tokens),
            qiwi: QiwiNotificationHandler::new(core),
        }
    }

    pub async fn dispatch(&self, endpoint: Endpoint, envelope: &CallbackEnvelope) -> EndpointResponse {
        tracing::debug!(
            endpoint = endpoint.name(),
            source_ip = envelope.source_ip.as_deref().unwrap_or("-"),
            params = envelope.raw_params.len(),
            "Dispatching callback"
        );
        match endpoint {
            Endpoint::PayMasterPayment => self.pages.handle(PaymentPage::PayMaster, envelope).await,
            Endpoint::PayMasterRecurring => {
                self.pages
                    .handle(PaymentPage::PayMasterRecurring, envelope)
                    .await
            }
            Endpoint::QiwiPullPayment => self.pages.handle(PaymentPage::QiwiPull, envelope).await,
            Endpoint::PayMasterResult => self.paymaster_result.handle(envelope).await,
            Endpoint::PayMasterRecurringResult => self.recurring_result.handle(envelope).await,
            Endpoint::QiwiPullResult => self.qiwi.handle(envelope).await.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBillingCore, ScriptedProviderHttp};
    use crate::domain::signature::OrderedParams;
    use crate::ports::SystemClock;

    #[test]
    fn names_round_trip() {
        for endpoint in Endpoint::ALL {
            assert_eq!(Endpoint::from_name(endpoint.name()).unwrap(), endpoint);
        }
    }

    #[test]
    fn php_suffix_is_accepted() {
        assert_eq!(
            Endpoint::from_name("qiwipullresult.php").unwrap(),
            Endpoint::QiwiPullResult
        );
    }

    #[test]
    fn unknown_name_is_unknown_command() {
        assert!(matches!(
            Endpoint::from_name("nowpaymentsresult"),
            Err(BillingError::UnknownCommand(_))
        ));
    }

    #[tokio::test]
    async fn qiwi_result_answers_with_xml_ack() {
        let core = Arc::new(InMemoryBillingCore::new());
        let router = CallbackRouter::new(
            core.clone(),
            Arc::new(ScriptedProviderHttp::new()),
            Arc::new(SystemClock),
            &AppConfig::default(),
        );

        let envelope = CallbackEnvelope::new(OrderedParams::new().with("bill_id", "1"));
        let response = router.dispatch(Endpoint::QiwiPullResult, &envelope).await;

        assert_eq!(response.status, 200);
        assert!(response.body.contains("<result_code>151</result_code>"));
        assert!(core.calls().is_empty());
    }
}
