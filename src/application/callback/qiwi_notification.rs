//! QIWI pull-bill notification handler.
//!
//! QIWI retries a notification until it receives `result_code` 0, so every
//! outcome is answered with a `<result>` document and HTTP 200. Checks run
//! in a fixed order and the first failing one decides the code:
//!
//! | check                              | code |
//! |------------------------------------|------|
//! | `X-Api-Signature` present          | 151  |
//! | `Authorization` credentials present| 150  |
//! | `bill_id` present                  | 5    |
//! | credentials match the method       | 150  |
//! | signature matches                  | 151  |
//! | `command` is `bill`                | 5    |
//! | error/amount/currency/status valid | 5    |
//!
//! Billing core or configuration failures answer 300 so QIWI retries.

use std::sync::Arc;

use crate::adapters::xml::XmlNode;
use crate::application::EndpointResponse;
use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::{classify, CallbackEnvelope, Settlement, StatusVocabulary};
use crate::domain::signature::{NotificationSigner, SignatureError};
use crate::ports::BillingCore;

/// Acknowledgment document returned to QIWI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QiwiAck {
    pub result_code: u16,
    pub description: Option<String>,
}

impl QiwiAck {
    pub const SUCCESS: u16 = 0;
    pub const FORMAT_ERROR: u16 = 5;
    pub const AUTH_ERROR: u16 = 150;
    pub const SIGNATURE_ERROR: u16 = 151;
    pub const TECHNICAL_ERROR: u16 = 300;

    pub fn success() -> Self {
        Self {
            result_code: Self::SUCCESS,
            description: None,
        }
    }

    pub fn failure(result_code: u16, description: impl Into<String>) -> Self {
        Self {
            result_code,
            description: Some(description.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_code == Self::SUCCESS
    }

    pub fn render(&self) -> String {
        let mut result = XmlNode::new("result")
            .with_child(XmlNode::new("result_code").with_text(self.result_code.to_string()));
        if let Some(description) = &self.description {
            result.add_child(XmlNode::new("description").with_text(description.as_str()));
        }
        result.to_document()
    }

    pub fn into_response(self) -> EndpointResponse {
        EndpointResponse::xml(self.render())
    }
}

impl From<SignatureError> for QiwiAck {
    fn from(err: SignatureError) -> Self {
        let code = match err {
            SignatureError::MissingAuthorization | SignatureError::BadAuthorization => {
                QiwiAck::AUTH_ERROR
            }
            _ => QiwiAck::SIGNATURE_ERROR,
        };
        QiwiAck::failure(code, err.to_string())
    }
}

/// Handles `qiwipullresult` notifications.
pub struct QiwiNotificationHandler {
    core: Arc<dyn BillingCore>,
}

impl QiwiNotificationHandler {
    pub fn new(core: Arc<dyn BillingCore>) -> Self {
        Self { core }
    }

    pub async fn handle(&self, envelope: &CallbackEnvelope) -> QiwiAck {
        let ack = self.process(envelope).await;
        tracing::info!(
            bill_id = envelope.param("bill_id").unwrap_or_default(),
            result_code = ack.result_code,
            description = ack.description.as_deref().unwrap_or_default(),
            "QIWI notification answered"
        );
        ack
    }

    async fn process(&self, envelope: &CallbackEnvelope) -> QiwiAck {
        // 1. Presence checks, before any billing core contact
        if envelope.signature_header.as_deref().unwrap_or_default().is_empty() {
            return SignatureError::MissingSignature.into();
        }
        if credentials(envelope.authorization_header.as_deref()).is_none() {
            return SignatureError::MissingAuthorization.into();
        }
        let bill_id = match envelope.param("bill_id") {
            Some(raw) => raw,
            None => return QiwiAck::failure(QiwiAck::FORMAT_ERROR, "empty elid"),
        };
        let elid = match ElId::parse("bill_id", bill_id) {
            Ok(elid) => elid,
            Err(_) => return QiwiAck::failure(QiwiAck::FORMAT_ERROR, "invalid data"),
        };

        // 2. Verify against the payment method's own credentials
        let payment = match self.core.payment_info(&elid).await {
            Ok(payment) => payment,
            Err(e) => return technical_error(&elid, &e),
        };
        let signer = match (
            payment.method.require("PRV_ID"),
            payment.method.secret("NOTIFY_PASSWORD"),
        ) {
            (Ok(provider_id), Ok(password)) => NotificationSigner::new(provider_id, password),
            (Err(e), _) | (_, Err(e)) => return technical_error(&elid, &e),
        };
        if let Err(e) = signer.verify_authorization(envelope.authorization_header.as_deref()) {
            tracing::warn!(elid = %elid, source_ip = ?envelope.source_ip, "QIWI authorization rejected");
            return e.into();
        }
        if let Err(e) = signer.verify(&envelope.raw_params, envelope.signature_header.as_deref()) {
            tracing::warn!(elid = %elid, source_ip = ?envelope.source_ip, "QIWI signature rejected");
            return e.into();
        }

        // 3. Classify
        if envelope.param("command") != Some("bill") {
            return QiwiAck::failure(QiwiAck::FORMAT_ERROR, "invalid command");
        }
        let settlement = Settlement {
            expected_amount: &payment.amount,
            expected_currency: &payment.currency,
            actual_amount: envelope.raw_params.get_or_empty("amount"),
            actual_currency: envelope.raw_params.get_or_empty("ccy"),
        };
        let outcome = classify(
            StatusVocabulary::QiwiBill,
            envelope.raw_params.get_or_empty("status"),
            envelope.raw_params.get_or_empty("error"),
            &settlement,
        );
        let transition = match outcome.map(|o| o.callback_transition()) {
            Ok(Some(transition)) => transition,
            Ok(None) => {
                tracing::warn!(
                    elid = %elid,
                    status = envelope.raw_params.get_or_empty("status"),
                    "Unknown QIWI bill status"
                );
                return QiwiAck::failure(QiwiAck::FORMAT_ERROR, "invalid data");
            }
            Err(e) => {
                tracing::warn!(elid = %elid, error = %e, "QIWI notification failed settlement check");
                return QiwiAck::failure(QiwiAck::FORMAT_ERROR, "invalid data");
            }
        };

        // 4. Apply
        if let Err(e) = self.core.apply_transition(&elid, transition).await {
            return technical_error(&elid, &e);
        }
        QiwiAck::success()
    }
}

/// Credentials part of an `Authorization: <scheme> <credentials>` header.
fn credentials(header: Option<&str>) -> Option<&str> {
    header?.split_whitespace().nth(1).filter(|c| !c.is_empty())
}

fn technical_error(elid: &ElId, err: &BillingError) -> QiwiAck {
    tracing::error!(elid = %elid, error = %err, "QIWI notification could not be processed");
    QiwiAck::failure(QiwiAck::TECHNICAL_ERROR, "technical error")
}
