//! Billing core client that shells out to the control utility.
//!
//! Each call runs `mgrctl -m <manager> -o xml <function> key=value ...`
//! and reads one XML document from stdout. A non-zero exit, an unreadable
//! document or an `<error>` element all surface as
//! [`BillingError::Upstream`].

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::documents::{decode_payment, decode_recurring, decode_task_type, error_message};
use crate::adapters::xml::XmlNode;
use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::{PaymentRecord, PaymentTransition};
use crate::domain::recurring::{ProfileUpdate, RecurringInfo, RecurringProfileStatus};
use crate::domain::signature::OrderedParams;
use crate::ports::{BillingCore, ServiceCompletion};

/// Parameters whose values are never written to the log.
const REDACTED_PARAMS: [&str; 3] = ["stored_token", "token", "errorxml"];

/// [`BillingCore`] backed by the local control utility.
pub struct MgrctlBillingCore {
    mgrctl_path: PathBuf,
    manager: String,
    timeout: Duration,
}

impl MgrctlBillingCore {
    pub fn new(mgrctl_path: impl Into<PathBuf>, manager: impl Into<String>, timeout: Duration) -> Self {
        Self {
            mgrctl_path: mgrctl_path.into(),
            manager: manager.into(),
            timeout,
        }
    }

    /// Runs one control utility function and returns its document.
    pub async fn query(&self, function: &str, params: OrderedParams) -> Result<XmlNode, BillingError> {
        let logged: Vec<String> = params
            .iter()
            .map(|(k, v)| {
                if REDACTED_PARAMS.contains(&k) {
                    format!("{}=<redacted>", k)
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect();
        tracing::info!(function, params = %logged.join(" "), "Billing core query");

        let mut command = Command::new(&self.mgrctl_path);
        command
            .arg("-m")
            .arg(&self.manager)
            .arg("-o")
            .arg("xml")
            .arg(function)
            .args(params.iter().map(|(k, v)| format!("{}={}", k, v)))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                tracing::error!(function, timeout_secs = self.timeout.as_secs(), "Billing core query timed out");
                BillingError::billing_core(format!("{} timed out", function))
            })?
            .map_err(|e| {
                BillingError::billing_core(format!(
                    "cannot run {}: {}",
                    self.mgrctl_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(function, status = %output.status, stderr = %stderr.trim(), "Billing core query failed");
            return Err(BillingError::billing_core(format!(
                "{} exited with {}",
                function, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let doc = XmlNode::parse(&stdout).map_err(|e| {
            BillingError::billing_core(format!("{} returned unreadable output: {}", function, e))
        })?;

        if let Some(message) = error_message(&doc) {
            tracing::error!(function, error = %message, "Billing core returned an error");
            return Err(BillingError::billing_core(format!("{}: {}", function, message)));
        }

        tracing::debug!(function, "Billing core query succeeded");
        Ok(doc)
    }
}

fn elid_params(elid: &ElId) -> OrderedParams {
    OrderedParams::new().with("elid", elid.as_str())
}

#[async_trait]
impl BillingCore for MgrctlBillingCore {
    async fn payment_info(&self, elid: &ElId) -> Result<PaymentRecord, BillingError> {
        let doc = self.query("payment.info", elid_params(elid)).await?;
        decode_payment(&doc)
    }

    async fn recurring_info(&self, elid: &ElId) -> Result<RecurringInfo, BillingError> {
        let doc = self.query("payment.recurring.info", elid_params(elid)).await?;
        decode_recurring(&doc, elid)
    }

    async fn apply_transition(
        &self,
        elid: &ElId,
        transition: PaymentTransition,
    ) -> Result<(), BillingError> {
        self.query(transition.command(), elid_params(elid)).await?;
        Ok(())
    }

    async fn delete_payment(&self, elid: &ElId) -> Result<(), BillingError> {
        self.query("payment.delete", elid_params(elid)).await?;
        Ok(())
    }

    async fn save_recurring(&self, elid: &ElId, update: ProfileUpdate) -> Result<(), BillingError> {
        let mut params = elid_params(elid).with("sok", "ok");
        let function = match update.status {
            RecurringProfileStatus::SavedCard(status) => {
                params.insert("stored_status", status.code().to_string());
                if let Some(token) = &update.token {
                    params.insert("stored_token", token.token());
                    params.insert("stored_name", token.account_identifier.as_str());
                    params.insert("stored_expire_date", token.expire_date());
                }
                "stored_method.save"
            }
            RecurringProfileStatus::Autopayment(status) => {
                params.insert("status", status.code().to_string());
                if let Some(token) = &update.token {
                    params.insert("token", token.token());
                    params.insert("data1", token.account_identifier.as_str());
                    params.insert("data2", token.account_identifier.as_str());
                }
                "payment.recurring.saveinfo"
            }
        };
        self.query(function, params).await?;
        Ok(())
    }

    async fn complete_service_operation(
        &self,
        completion: ServiceCompletion,
        item: &ElId,
    ) -> Result<(), BillingError> {
        self.query(completion.command(), elid_params(item).with("sok", "ok"))
            .await?;
        Ok(())
    }

    async fn record_operation_error(
        &self,
        operation: &ElId,
        error_xml: &str,
    ) -> Result<(), BillingError> {
        let params = OrderedParams::new()
            .with("sok", "ok")
            .with("elid", operation.as_str())
            .with("errorxml", error_xml);
        self.query("runningoperation.edit", params).await?;
        Ok(())
    }

    async fn set_operation_manual(&self, operation: &ElId) -> Result<(), BillingError> {
        self.query("runningoperation.setmanual", elid_params(operation))
            .await?;
        Ok(())
    }

    async fn task_type(&self, command: &str) -> Result<Option<String>, BillingError> {
        let doc = self
            .query("task.gettype", OrderedParams::new().with("operation", command))
            .await?;
        Ok(decode_task_type(&doc))
    }

    async fn create_task(
        &self,
        item: &ElId,
        operation: &ElId,
        task_type: &str,
    ) -> Result<(), BillingError> {
        let params = OrderedParams::new()
            .with("sok", "ok")
            .with("item", item.as_str())
            .with("runningoperation", operation.as_str())
            .with("type", task_type);
        self.query("task.edit", params).await?;
        Ok(())
    }
}
