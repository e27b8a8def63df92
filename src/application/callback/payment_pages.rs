//! Redirect pages that send a customer from the billing panel to a provider.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use url::Url;

use crate::application::recurring::TokenLifecycleManager;
use crate::application::{AutoSubmitForm, EndpointResponse};
use crate::config::{PayMasterConfig, QiwiConfig};
use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::{CallbackEnvelope, PaymentRecord};
use crate::domain::signature::OrderedParams;
use crate::ports::BillingCore;

/// PayMaster payment method code for bank cards.
const CARD_METHOD: &str = "503";

/// Which provider page to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPage {
    /// One-off PayMaster payment.
    PayMaster,
    /// QIWI bill payment.
    QiwiPull,
    /// PayMaster card authorization for recurring payments.
    PayMasterRecurring,
}

impl PaymentPage {
    pub fn module(&self) -> &'static str {
        match self {
            PaymentPage::PayMaster => "paymasterpayment",
            PaymentPage::QiwiPull => "qiwipullpayment",
            PaymentPage::PayMasterRecurring => "paymasterrecurring",
        }
    }
}

/// Builds the auto-submitting provider forms.
///
/// Every page requires the panel's `auth` session parameter.
pub struct PaymentPageHandler {
    core: Arc<dyn BillingCore>,
    tokens: Arc<TokenLifecycleManager>,
    paymaster: PayMasterConfig,
    qiwi: QiwiConfig,
}

impl PaymentPageHandler {
    pub fn new(
        core: Arc<dyn BillingCore>,
        tokens: Arc<TokenLifecycleManager>,
        paymaster: PayMasterConfig,
        qiwi: QiwiConfig,
    ) -> Self {
        Self {
            core,
            tokens,
            paymaster,
            qiwi,
        }
    }

    pub async fn handle(&self, page: PaymentPage, envelope: &CallbackEnvelope) -> EndpointResponse {
        match self.build(page, envelope).await {
            Ok(form) => EndpointResponse::html(form.render()),
            Err(e) => {
                tracing::error!(page = page.module(), error = %e, "Payment page not built");
                EndpointResponse::error(&e)
            }
        }
    }

    pub async fn build(&self, page: PaymentPage, envelope: &CallbackEnvelope) -> Result<AutoSubmitForm, BillingError> {
        if envelope.param("auth").is_none() {
            return Err(BillingError::authentication("no auth info"));
        }
        let elid = ElId::parse("elid", envelope.require("elid")?)?;

        match page {
            PaymentPage::PayMaster => {
                let payment = self.core.payment_info(&elid).await?;
                self.paymaster_form(&payment)
            }
            PaymentPage::QiwiPull => {
                let payment = self.core.payment_info(&elid).await?;
                self.qiwi_form(&payment)
            }
            PaymentPage::PayMasterRecurring => {
                self.tokens
                    .authorization_form(&elid, envelope.require_host()?)
                    .await
            }
        }
    }

    fn paymaster_form(&self, payment: &PaymentRecord) -> Result<AutoSubmitForm, BillingError> {
        let result_url = panel_url(payment.require_manager_url()?, "/mancgi/paymasterresult")?;
        let description = payment.description.as_deref().unwrap_or_default();

        let fields = OrderedParams::new()
            .with("LMI_RESULT_URL", result_url.as_str())
            .with("LMI_PAYMENT_NOTIFICATION_URL", result_url.as_str())
            .with("LMI_MERCHANT_ID", payment.method.require("LMI_MERCHANT_ID")?)
            .with("LMI_PAYMENT_AMOUNT", payment.amount.as_str())
            .with("LMI_CURRENCY", payment.currency.as_str())
            .with("LMI_PAYMENT_NO", payment.id.as_str())
            .with("LMI_PAYMENT_DESC", description)
            .with("LMI_PAYMENT_DESC_BASE64", BASE64_STANDARD.encode(description))
            .with("LMI_PAYMENT_METHOD", CARD_METHOD);

        Ok(AutoSubmitForm::new(self.paymaster.url("/payment/init"), fields))
    }

    fn qiwi_form(&self, payment: &PaymentRecord) -> Result<AutoSubmitForm, BillingError> {
        let manager_url = payment.require_manager_url()?;
        let back_url = |func: &str| {
            format!(
                "{}?func={}&elid={}&module={}",
                manager_url,
                func,
                payment.id,
                PaymentPage::QiwiPull.module()
            )
        };

        let fields = OrderedParams::new()
            .with("shop", payment.method.require("PRV_ID")?)
            .with("transaction", payment.id.as_str())
            .with("successUrl", back_url("payment.success"))
            .with("failUrl", back_url("payment.fail"));

        Ok(AutoSubmitForm::new(self.qiwi.payment_url.as_str(), fields))
    }
}

/// Absolute URL of a CGI path on the panel's host.
fn panel_url(manager_url: &str, path: &str) -> Result<Url, BillingError> {
    Url::parse(manager_url)
        .and_then(|base| base.join(path))
        .map_err(|e| BillingError::configuration("manager_url", e.to_string()))
}
