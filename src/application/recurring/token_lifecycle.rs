//! Obtains, stores, reuses and revokes PayMaster stored-payment tokens.
//!
//! Every provider call is signed with the payment method's own secrets
//! taken fresh from the billing core: the authorization exchange uses
//! `direct_secret`, charges and revokes use `secret`.

use std::sync::Arc;

use serde_json::Value;

use crate::application::AutoSubmitForm;
use crate::config::PayMasterConfig;
use crate::domain::foundation::{BillingError, ElId, StateMachine};
use crate::domain::payment::{has_error_field, PaymentOutcome, PaymentRecord};
use crate::domain::recurring::{
    ChargeInit, ProfileUpdate, RecurringInfo, RecurringProfileStatus, TokenResponse, TokenState,
    TransactionStatus,
};
use crate::domain::signature::{DirectSigner, OrderedParams};
use crate::ports::{BillingCore, Clock, ProviderHttp, ProviderRequest};

/// Path the provider redirects back to after authorization.
pub const RECURRING_RESULT_PATH: &str = "/mancgi/paymasterrecurringresult";

const AUTH_PATH: &str = "/direct/security/auth";
const TOKEN_PATH: &str = "/direct/security/token";
const INIT_PATH: &str = "/direct/payment/init";
const COMPLETE_PATH: &str = "/direct/payment/complete";

/// PayMaster payment method code for bank cards.
const CARD_SCOPE: &str = "503";

/// Where the customer goes after an authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// Token persisted.
    Stored { redirect_url: String },
    /// Nothing persisted.
    Failed { redirect_url: String, reason: String },
}

impl AuthorizationOutcome {
    pub fn redirect_url(&self) -> &str {
        match self {
            AuthorizationOutcome::Stored { redirect_url }
            | AuthorizationOutcome::Failed { redirect_url, .. } => redirect_url,
        }
    }
}

/// Token lifecycle for PayMaster recurring profiles.
pub struct TokenLifecycleManager {
    core: Arc<dyn BillingCore>,
    http: Arc<dyn ProviderHttp>,
    clock: Arc<dyn Clock>,
    paymaster: PayMasterConfig,
}

impl TokenLifecycleManager {
    pub fn new(
        core: Arc<dyn BillingCore>,
        http: Arc<dyn ProviderHttp>,
        clock: Arc<dyn Clock>,
        paymaster: PayMasterConfig,
    ) -> Self {
        Self {
            core,
            http,
            clock,
            paymaster,
        }
    }

    /// Builds the signed form that sends the customer to the provider's
    /// authorization page.
    pub async fn authorization_form(
        &self,
        elid: &ElId,
        host: &str,
    ) -> Result<AutoSubmitForm, BillingError> {
        let info = self.core.recurring_info(elid).await?;
        begin_request(TokenState::of_profile(info.profile.status))?;

        let method = &info.payment.method;
        let fields = OrderedParams::new()
            .with("response_type", "code")
            .with("scope", CARD_SCOPE)
            .with("type", "rest")
            .with("redirect_uri", redirect_uri(host, elid))
            .with("client_id", method.require("LMI_MERCHANT_ID")?)
            .with(format!("limits[{}]", info.payment.currency), info.limits());

        let signer = DirectSigner::new(method.secret("direct_secret")?);
        let payload = signer.sign_payload(fields, self.clock.now().timestamp());

        tracing::info!(elid = %elid, "Authorization form built");
        Ok(AutoSubmitForm::new(self.paymaster.url(AUTH_PATH), payload))
    }

    /// Exchanges an authorization code for a token and stores it.
    ///
    /// Provider-side failures become [`AuthorizationOutcome::Failed`];
    /// only billing core failures are returned as errors.
    pub async fn complete_authorization(
        &self,
        elid: &ElId,
        code: &str,
        host: &str,
    ) -> Result<AuthorizationOutcome, BillingError> {
        // 1. Load the profile and the payment that created it
        let info = self.core.recurring_info(elid).await?;
        let status = info.profile.status;
        let requesting = begin_request(TokenState::of_profile(status))?;
        let manager_url = info.payment.require_manager_url()?.to_string();
        if code.is_empty() {
            tracing::warn!(elid = %elid, "Authorization returned without a code");
            return Ok(failed(&manager_url, status, "authorization code missing".to_string()));
        }

        // 2. Exchange the code
        let token = match self.exchange_code(&info, elid, code, host).await {
            Ok(TokenResponse::Issued(token)) => token,
            Ok(TokenResponse::Rejected { error }) => {
                tracing::warn!(elid = %elid, error = %error, "Token exchange rejected");
                return Ok(failed(&manager_url, status, error));
            }
            Err(e) => {
                tracing::error!(elid = %elid, error = %e, "Token exchange failed");
                return Ok(failed(&manager_url, status, e.to_string()));
            }
        };

        // 3. Persist in the profile's own vocabulary
        requesting.transition_to(TokenState::Stored)?;
        let expire_date = token.expire_date();
        self.core
            .save_recurring(elid, ProfileUpdate::with_token(status.stored(), token))
            .await?;

        tracing::info!(elid = %elid, expire_date = %expire_date, "Token stored");
        Ok(AuthorizationOutcome::Stored {
            redirect_url: result_page(&manager_url, status, true),
        })
    }

    /// Charges a payment against its recurring profile's stored token.
    ///
    /// The transaction status lookup, not the init reply, decides the
    /// transition. An unrecognized status applies nothing and is returned
    /// as an error.
    pub async fn charge(&self, payment_elid: &ElId) -> Result<PaymentOutcome, BillingError> {
        // 1. Load payment and profile
        let payment = self.core.payment_info(payment_elid).await?;
        let recurring_elid = payment
            .recurring
            .clone()
            .ok_or_else(|| BillingError::missing("recurring"))?;
        let info = self.core.recurring_info(&recurring_elid).await?;

        // 2. Refuse profiles without a live token
        let status = info.profile.status;
        if !status.is_active() {
            return Err(BillingError::invalid_value(
                "recurring",
                status.to_string(),
                "recurring profile has no active token",
            ));
        }
        TokenState::of_profile(status).transition_to(TokenState::Reused)?;
        let token = info.profile.require_token()?;

        // 3. Start the charge
        let signer = DirectSigner::new(payment.method.secret("secret")?);
        let merchant_id = payment.method.require("LMI_MERCHANT_ID")?;
        let init = OrderedParams::new()
            .with("access_token", token)
            .with("merchant_id", merchant_id)
            .with("merchant_transaction_id", payment.id.as_str())
            .with("amount", payment.amount.as_str())
            .with("currency", payment.currency.as_str())
            .with("description", payment.description.as_deref().unwrap_or_default())
            .with("type", "rest");
        let body = self.signed_post(INIT_PATH, init, &signer).await?;

        let processor_transaction_id = match ChargeInit::parse(&body)? {
            ChargeInit::Accepted {
                processor_transaction_id,
            } => processor_transaction_id,
            ChargeInit::Refused { error } => {
                tracing::warn!(elid = %payment_elid, error = %error, "Charge refused");
                self.settle(&payment, PaymentOutcome::Declined).await?;
                return Ok(PaymentOutcome::Declined);
            }
        };

        // 4. Ask for the authoritative status
        let complete = OrderedParams::new()
            .with("access_token", token)
            .with("merchant_id", merchant_id)
            .with("merchant_transaction_id", payment.id.as_str())
            .with("processor_transaction_id", processor_transaction_id.as_str())
            .with("type", "rest");
        let body = self.signed_post(COMPLETE_PATH, complete, &signer).await?;
        let transaction = TransactionStatus::parse(&body)?;
        let outcome = transaction.outcome();

        tracing::info!(
            elid = %payment_elid,
            processor_transaction_id = %processor_transaction_id,
            status = %transaction.status,
            outcome = ?outcome,
            "Charge status received"
        );

        if outcome == PaymentOutcome::Error {
            return Err(BillingError::provider(format!(
                "unrecognized transaction status '{}'",
                transaction.status
            )));
        }
        self.settle(&payment, outcome).await?;
        Ok(outcome)
    }

    /// Revokes a profile's token at the provider, then closes the profile.
    ///
    /// The local profile is only changed once the provider confirms; on any
    /// failure the token stays stored.
    pub async fn revoke(&self, recurring_elid: &ElId) -> Result<(), BillingError> {
        let info = self.core.recurring_info(recurring_elid).await?;
        let status = info.profile.status;
        let revoking = TokenState::of_profile(status).transition_to(TokenState::Revoking)?;

        let method = &info.payment.method;
        let signer = DirectSigner::new(method.secret("secret")?);
        let fields = OrderedParams::new()
            .with("client_id", method.require("LMI_MERCHANT_ID")?)
            .with("access_token", info.profile.require_token()?)
            .with("type", "rest");
        let request = ProviderRequest::post(
            self.paymaster.url(TOKEN_PATH),
            signer.sign_payload(fields, self.clock.now().timestamp()),
        );

        let confirmed = match self.http.send(request).await {
            Ok(response) if response.is_success() && is_confirmation(&response.body) => Ok(()),
            Ok(response) => Err(BillingError::PaymentProcess(format!(
                "token revoke not confirmed (HTTP {})",
                response.status
            ))),
            Err(e) => Err(e),
        };
        if let Err(e) = confirmed {
            revoking.transition_to(TokenState::Stored)?;
            tracing::warn!(elid = %recurring_elid, error = %e, "Token revoke failed, token kept");
            return Err(e);
        }

        revoking.transition_to(TokenState::Revoked)?;
        self.core
            .save_recurring(recurring_elid, ProfileUpdate::status_only(status.closed()))
            .await?;
        tracing::info!(elid = %recurring_elid, "Token revoked");
        Ok(())
    }

    async fn exchange_code(
        &self,
        info: &RecurringInfo,
        elid: &ElId,
        code: &str,
        host: &str,
    ) -> Result<TokenResponse, BillingError> {
        let method = &info.payment.method;
        let fields = OrderedParams::new()
            .with("code", code)
            .with("client_id", method.require("LMI_MERCHANT_ID")?)
            .with("grant_type", "authorization_code")
            .with("redirect_uri", redirect_uri(host, elid))
            .with("type", "rest");
        let signer = DirectSigner::new(method.secret("direct_secret")?);

        let body = self.signed_post(TOKEN_PATH, fields, &signer).await?;
        TokenResponse::parse(&body, self.clock.now())
    }

    async fn signed_post(
        &self,
        path: &str,
        fields: OrderedParams,
        signer: &DirectSigner,
    ) -> Result<String, BillingError> {
        let payload = signer.sign_payload(fields, self.clock.now().timestamp());
        let response = self
            .http
            .send(ProviderRequest::post(self.paymaster.url(path), payload))
            .await?;
        Ok(response.body)
    }

    async fn settle(&self, payment: &PaymentRecord, outcome: PaymentOutcome) -> Result<(), BillingError> {
        if let Some(transition) = outcome.charge_transition() {
            self.core.apply_transition(&payment.id, transition).await?;
        }
        Ok(())
    }
}

fn begin_request(state: TokenState) -> Result<TokenState, BillingError> {
    match state {
        TokenState::Requesting => Ok(state),
        other => other.transition_to(TokenState::Requesting),
    }
}

fn redirect_uri(host: &str, elid: &ElId) -> String {
    format!("https://{}{}?elid={}", host, RECURRING_RESULT_PATH, elid)
}

fn result_page(manager_url: &str, status: RecurringProfileStatus, success: bool) -> String {
    let func = match (status.is_autopayment(), success) {
        (false, true) => "payment.stored_methods.success",
        (false, false) => "payment.stored_methods.fail",
        (true, true) => "payment.recurring.success",
        (true, false) => "payment.recurring.fail",
    };
    format!("{}?func={}", manager_url, func)
}

fn failed(manager_url: &str, status: RecurringProfileStatus, reason: String) -> AuthorizationOutcome {
    AuthorizationOutcome::Failed {
        redirect_url: result_page(manager_url, status, false),
        reason,
    }
}

fn is_confirmation(body: &str) -> bool {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => !has_error_field(&json),
        Err(_) => false,
    }
}
