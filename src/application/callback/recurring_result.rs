//! Return point of the PayMaster card authorization (`paymasterrecurringresult`).

use std::sync::Arc;

use crate::application::recurring::{AuthorizationOutcome, TokenLifecycleManager};
use crate::application::EndpointResponse;
use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::CallbackEnvelope;

/// Exchanges the returned code and redirects the customer to the
/// success or failure page of the profile's vocabulary.
pub struct RecurringResultHandler {
    tokens: Arc<TokenLifecycleManager>,
}

impl RecurringResultHandler {
    pub fn new(tokens: Arc<TokenLifecycleManager>) -> Self {
        Self { tokens }
    }

    pub async fn handle(&self, envelope: &CallbackEnvelope) -> EndpointResponse {
        match self.process(envelope).await {
            Ok(outcome) => EndpointResponse::redirect(outcome.redirect_url()),
            Err(e) => {
                tracing::error!(error = %e, "Authorization result not processed");
                EndpointResponse::error(&e)
            }
        }
    }

    async fn process(&self, envelope: &CallbackEnvelope) -> Result<AuthorizationOutcome, BillingError> {
        let elid = ElId::parse("elid", envelope.require("elid")?)?;
        let host = envelope.require_host()?;
        let code = envelope.param("code").unwrap_or_default();
        self.tokens.complete_authorization(&elid, code, host).await
    }
}
