//! `pmqiwipull` commands: method settings forms and the bill lifecycle.

use std::sync::Arc;

use chrono::Duration;

use crate::adapters::xml::XmlNode;
use crate::config::QiwiConfig;
use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::{PaymentRecord, PaymentTransition};
use crate::domain::signature::OrderedParams;
use crate::ports::{BasicAuth, BillingCore, Clock, HttpMethod, ProviderHttp, ProviderRequest};

use super::paymaster::required_id;
use super::{CommandOutput, FormReader, PaymethodConfig};

/// Bill lifetime when the method sets no `autoclearperiod`.
const DEFAULT_LIFETIME_DAYS: i64 = 30;

const RESULT_OK: &str = "0";
/// Cancel of a bill that is already rejected.
const RESULT_ALREADY_REJECTED: &str = "210";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QiwiCommand {
    Config,
    /// Adds the `pay_source` choices to the method settings form.
    PmTune { form: XmlNode },
    /// Checks the numeric account ids of the method settings form.
    PmValidate { form: XmlNode },
    /// Rejects the bill, then deletes the payment.
    CrDelete { payment: ElId },
    /// Points the payment form at the redirect page.
    CrValidate { form: XmlNode },
    /// Issues the bill and marks the payment in progress.
    CrSet { payment: ElId },
}

impl QiwiCommand {
    pub fn parse(
        command: &str,
        payment: Option<&str>,
        read_form: FormReader<'_>,
    ) -> Result<Self, BillingError> {
        match command {
            "config" => Ok(QiwiCommand::Config),
            "pmtune" => Ok(QiwiCommand::PmTune { form: read_form()? }),
            "pmvalidate" => Ok(QiwiCommand::PmValidate { form: read_form()? }),
            "crdelete" => Ok(QiwiCommand::CrDelete {
                payment: required_id("payment", payment)?,
            }),
            "crvalidate" => Ok(QiwiCommand::CrValidate { form: read_form()? }),
            "crset" => Ok(QiwiCommand::CrSet {
                payment: required_id("payment", payment)?,
            }),
            other => Err(BillingError::UnknownCommand(other.to_string())),
        }
    }
}

/// Runs QIWI commands against the bill API.
pub struct QiwiCommands {
    core: Arc<dyn BillingCore>,
    http: Arc<dyn ProviderHttp>,
    clock: Arc<dyn Clock>,
    qiwi: QiwiConfig,
}

impl QiwiCommands {
    pub fn new(
        core: Arc<dyn BillingCore>,
        http: Arc<dyn ProviderHttp>,
        clock: Arc<dyn Clock>,
        qiwi: QiwiConfig,
    ) -> Self {
        Self {
            core,
            http,
            clock,
            qiwi,
        }
    }

    pub async fn handle(&self, command: QiwiCommand) -> Result<CommandOutput, BillingError> {
        match command {
            QiwiCommand::Config => Ok(CommandOutput::Document(config().to_node())),
            QiwiCommand::PmTune { form } => Ok(CommandOutput::Document(tune(form))),
            QiwiCommand::PmValidate { form } => validate(form).map(CommandOutput::Document),
            QiwiCommand::CrValidate { form } => Ok(CommandOutput::Document(point_to_payment_page(form))),
            QiwiCommand::CrSet { payment } => self.create_bill(&payment).await,
            QiwiCommand::CrDelete { payment } => self.cancel_bill(&payment).await,
        }
    }

    async fn create_bill(&self, elid: &ElId) -> Result<CommandOutput, BillingError> {
        // 1. Bill fields from the payment
        let payment = self.core.payment_info(elid).await?;
        let lifetime_days = match payment.method.value("autoclearperiod") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                BillingError::configuration("autoclearperiod", format!("'{}' is not a number of days", raw))
            })?,
            None => DEFAULT_LIFETIME_DAYS,
        };
        let lifetime = Some(lifetime_days)
            .filter(|days| *days > 0)
            .and_then(Duration::try_days)
            .and_then(|period| self.clock.now().checked_add_signed(period))
            .ok_or_else(|| {
                BillingError::configuration(
                    "autoclearperiod",
                    format!("{} is not a usable number of days", lifetime_days),
                )
            })?;
        let phone: String = payment
            .phone
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();

        let form = OrderedParams::new()
            .with("user", format!("tel:+{}", phone))
            .with("amount", payment.amount.as_str())
            .with("ccy", payment.currency.as_str())
            .with("pay_source", payment.method.value("pay_source").unwrap_or_default())
            .with("prv_name", payment.project_name.as_deref().unwrap_or_default())
            .with("comment", payment.number.as_deref().unwrap_or_default())
            .with("lifetime", lifetime.format("%Y-%m-%dT%H:%M:%S").to_string());

        // 2. Issue the bill
        let reply = self.bill_request(&payment, HttpMethod::Put, form).await?;
        if reply.code != RESULT_OK {
            tracing::warn!(elid = %elid, result_code = %reply.code, "QIWI bill not created");
            return Err(BillingError::PaymentProcess(reply.description));
        }

        // 3. Waiting for the customer
        self.core
            .apply_transition(elid, PaymentTransition::SetInPay)
            .await?;
        tracing::info!(elid = %elid, lifetime_days, "QIWI bill created");
        Ok(CommandOutput::Silent)
    }

    async fn cancel_bill(&self, elid: &ElId) -> Result<CommandOutput, BillingError> {
        let payment = self.core.payment_info(elid).await?;
        let form = OrderedParams::new().with("status", "rejected");

        let reply = self.bill_request(&payment, HttpMethod::Patch, form).await?;
        if reply.code != RESULT_OK && reply.code != RESULT_ALREADY_REJECTED {
            tracing::warn!(elid = %elid, result_code = %reply.code, "QIWI bill not rejected");
            return Err(BillingError::PaymentProcess(reply.description));
        }

        self.core.delete_payment(elid).await?;
        tracing::info!(elid = %elid, result_code = %reply.code, "QIWI bill rejected, payment deleted");
        Ok(CommandOutput::Silent)
    }

    async fn bill_request(
        &self,
        payment: &PaymentRecord,
        method: HttpMethod,
        form: OrderedParams,
    ) -> Result<BillReply, BillingError> {
        let settings = &payment.method;
        let url = self
            .qiwi
            .bill_url(settings.require("PRV_ID")?, payment.id.as_str());
        let auth = BasicAuth::new(settings.require("API_ID")?, settings.secret("API_PASSWORD")?);

        let response = self
            .http
            .send(ProviderRequest::new(method, url, form).with_basic_auth(auth))
            .await?;
        BillReply::parse(&response.body)
    }
}

/// `<response><result_code>..</result_code>[<description>..]</response>`
struct BillReply {
    code: String,
    description: String,
}

impl BillReply {
    fn parse(body: &str) -> Result<Self, BillingError> {
        let doc = XmlNode::parse(body)
            .map_err(|e| BillingError::provider(format!("unreadable QIWI reply: {}", e)))?;
        let code = doc
            .child_text("result_code")
            .ok_or_else(|| BillingError::provider("QIWI reply has no result_code"))?
            .to_string();
        let description = doc
            .child_text("description")
            .unwrap_or("bill request failed")
            .to_string();
        Ok(Self { code, description })
    }
}

fn config() -> PaymethodConfig {
    PaymethodConfig::new()
        .feature("redirect")
        .feature("notneedprofile")
        .feature("pmtune")
        .feature("pmvalidate")
        .feature("crvalidate")
        .feature("crset")
        .feature("crdelete")
        .param("payment_script", "/mancgi/qiwipullpayment")
}

fn tune(mut form: XmlNode) -> XmlNode {
    form.add_child(
        XmlNode::new("slist")
            .with_attr("name", "pay_source")
            .with_child(XmlNode::new("msg").with_text("qw"))
            .with_child(XmlNode::new("msg").with_text("mobile")),
    );
    form
}

fn validate(form: XmlNode) -> Result<XmlNode, BillingError> {
    for field in ["API_ID", "PRV_ID"] {
        let value = form.child(field).map(|n| n.text.trim()).unwrap_or_default();
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(BillingError::invalid_value(field, value, "must be numeric"));
        }
    }
    Ok(form)
}

fn point_to_payment_page(mut form: XmlNode) -> XmlNode {
    let payment_id = form.child_text("payment_id").unwrap_or_default().to_string();
    form.add_child(
        XmlNode::new("ok")
            .with_attr("type", "5")
            .with_text(format!("/mancgi/qiwipullpayment?elid={}", payment_id)),
    );
    form
}
