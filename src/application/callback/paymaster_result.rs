//! PayMaster payment notification (`paymasterresult`).

use std::sync::Arc;

use crate::application::EndpointResponse;
use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::{classify, CallbackEnvelope, Settlement, StatusVocabulary};
use crate::domain::signature::{ResultHash, SignatureError, HASH_FIELD};
use crate::ports::BillingCore;

/// Verifies `LMI_HASH` and marks the payment paid.
///
/// Replies with an empty `200` on success. Verification and integrity
/// failures get a 4xx error document; billing core failures get `502` so
/// PayMaster delivers the notification again.
pub struct PayMasterResultHandler {
    core: Arc<dyn BillingCore>,
}

impl PayMasterResultHandler {
    pub fn new(core: Arc<dyn BillingCore>) -> Self {
        Self { core }
    }

    pub async fn handle(&self, envelope: &CallbackEnvelope) -> EndpointResponse {
        match self.process(envelope).await {
            Ok(elid) => {
                tracing::info!(elid = %elid, "PayMaster payment confirmed");
                EndpointResponse::empty()
            }
            Err(e) => {
                tracing::warn!(
                    payment_no = envelope.param("LMI_PAYMENT_NO").unwrap_or_default(),
                    error = %e,
                    "PayMaster notification rejected"
                );
                EndpointResponse::error(&e)
            }
        }
    }

    async fn process(&self, envelope: &CallbackEnvelope) -> Result<ElId, BillingError> {
        // 1. Presence checks
        if envelope.param(HASH_FIELD).is_none() {
            return Err(SignatureError::MissingSignature.into());
        }
        let elid = ElId::parse("LMI_PAYMENT_NO", envelope.require("LMI_PAYMENT_NO")?)?;

        // 2. Verify with the method's secret
        let payment = self.core.payment_info(&elid).await?;
        ResultHash::new(payment.method.secret("secret")?).verify(&envelope.raw_params)?;

        // 3. Settlement
        let settlement = Settlement {
            expected_amount: &payment.amount,
            expected_currency: &payment.currency,
            actual_amount: envelope.raw_params.get_or_empty("LMI_PAYMENT_AMOUNT"),
            actual_currency: envelope.raw_params.get_or_empty("LMI_CURRENCY"),
        };
        let outcome = classify(StatusVocabulary::PayMasterNotification, "", "", &settlement)?;

        // 4. Apply
        if let Some(transition) = outcome.callback_transition() {
            self.core.apply_transition(&elid, transition).await?;
        }
        Ok(elid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingCore;
    use crate::domain::payment::{MethodConfig, PaymentRecord, PaymentTransition};
    use crate::domain::signature::OrderedParams;

    fn core() -> Arc<InMemoryBillingCore> {
        let record = PaymentRecord::new(ElId::parse("elid", "31").unwrap(), "500.00", "RUB")
            .with_method(MethodConfig::new().with("secret", "lmi-secret"));
        Arc::new(InMemoryBillingCore::new().with_payment(record))
    }

    fn notification(amount: &str) -> CallbackEnvelope {
        let mut params = OrderedParams::new()
            .with("LMI_MERCHANT_ID", "m-1")
            .with("LMI_PAYMENT_NO", "31")
            .with("LMI_SYS_PAYMENT_ID", "9001")
            .with("LMI_SYS_PAYMENT_DATE", "2026-10-01T10:00:00")
            .with("LMI_PAYMENT_AMOUNT", amount)
            .with("LMI_CURRENCY", "RUB")
            .with("LMI_PAID_AMOUNT", amount)
            .with("LMI_PAID_CURRENCY", "RUB")
            .with("LMI_PAYMENT_SYSTEM", "3")
            .with("LMI_SIM_MODE", "0");
        let hash = ResultHash::new("lmi-secret").compute(&params);
        params.insert(HASH_FIELD, hash);
        CallbackEnvelope::new(params)
    }

    #[tokio::test]
    async fn valid_notification_sets_paid() {
        let core = core();
        let handler = PayMasterResultHandler::new(core.clone());

        let response = handler.handle(&notification("500")).await;

        assert_eq!(response, EndpointResponse::empty());
        assert_eq!(core.payment_state("31"), Some(PaymentTransition::SetPaid));
    }

    #[tokio::test]
    async fn missing_hash_is_rejected_before_core() {
        let core = core();
        let handler = PayMasterResultHandler::new(core.clone());
        let mut envelope = notification("500.00");
        envelope.raw_params.remove(HASH_FIELD);

        let response = handler.handle(&envelope).await;

        assert_eq!(response.status, 403);
        assert!(core.calls().is_empty());
    }

    #[tokio::test]
    async fn tampered_amount_fails_hash() {
        let core = core();
        let handler = PayMasterResultHandler::new(core.clone());
        let mut envelope = notification("500.00");
        envelope.raw_params.insert("LMI_PAYMENT_AMOUNT", "5.00");

        let response = handler.handle(&envelope).await;

        assert_eq!(response.status, 403);
        assert_eq!(core.payment_state("31"), None);
    }

    #[tokio::test]
    async fn signed_but_wrong_amount_is_integrity_error() {
        let core = core();
        let handler = PayMasterResultHandler::new(core.clone());

        let response = handler.handle(&notification("499.99")).await;

        assert_eq!(response.status, 400);
        assert!(response.body.contains("type=\"integrity\""));
        assert_eq!(core.payment_state("31"), None);
    }

    #[tokio::test]
    async fn core_failure_asks_for_redelivery() {
        let core = core();
        core.fail_on("payment.setpaid", BillingError::billing_core("busy"));
        let handler = PayMasterResultHandler::new(core.clone());

        let response = handler.handle(&notification("500.00")).await;

        assert_eq!(response.status, 502);
    }
}
