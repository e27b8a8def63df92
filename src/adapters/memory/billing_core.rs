//! In-memory billing core for tests.
//!
//! Behaves like the real core where the plugins depend on it: transitions are
//! idempotent on `(elid, command)`, unknown ids fail loudly, and every call
//! is logged for assertions.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::{PaymentRecord, PaymentTransition};
use crate::domain::recurring::{ProfileUpdate, RecurringInfo, RecurringProfile};
use crate::ports::{BillingCore, ServiceCompletion};

/// One control utility call as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreCall {
    pub command: String,
    pub elid: String,
}

/// A task created through `task.edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTask {
    pub item: String,
    pub operation: String,
    pub task_type: String,
}

/// In-memory [`BillingCore`].
///
/// # Example
///
/// ```ignore
/// let core = Arc::new(InMemoryBillingCore::new().with_payment(record));
/// handler.handle(envelope).await;
/// assert_eq!(core.payment_state("42"), Some(PaymentTransition::SetPaid));
/// ```
#[derive(Default)]
pub struct InMemoryBillingCore {
    inner: Arc<Mutex<CoreState>>,
}

#[derive(Default)]
struct CoreState {
    payments: HashMap<String, PaymentRecord>,
    recurring: HashMap<String, RecurringInfo>,
    payment_states: HashMap<String, PaymentTransition>,
    effective_transitions: usize,
    deleted: HashSet<String>,
    task_types: HashMap<String, String>,
    completed: Vec<(ServiceCompletion, String)>,
    operation_errors: HashMap<String, String>,
    manual_operations: HashSet<String>,
    tasks: Vec<CreatedTask>,
    failures: HashMap<String, BillingError>,
    calls: Vec<CoreCall>,
}

impl InMemoryBillingCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payment(self, record: PaymentRecord) -> Self {
        self.inner
            .lock()
            .unwrap()
            .payments
            .insert(record.id.to_string(), record);
        self
    }

    pub fn with_recurring(self, info: RecurringInfo) -> Self {
        self.inner
            .lock()
            .unwrap()
            .recurring
            .insert(info.profile.id.to_string(), info);
        self
    }

    pub fn with_task_type(self, command: &str, task_type: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .task_types
            .insert(command.to_string(), task_type.to_string());
        self
    }

    /// Makes every call of `command` fail with `error`.
    pub fn fail_on(&self, command: &str, error: BillingError) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .insert(command.to_string(), error);
    }

    pub fn calls(&self) -> Vec<CoreCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.command == command).count()
    }

    /// Latest transition applied to a payment.
    pub fn payment_state(&self, elid: &str) -> Option<PaymentTransition> {
        self.inner.lock().unwrap().payment_states.get(elid).copied()
    }

    /// Number of transitions that actually changed a payment's state.
    pub fn effective_transitions(&self) -> usize {
        self.inner.lock().unwrap().effective_transitions
    }

    pub fn recurring_profile(&self, elid: &str) -> Option<RecurringProfile> {
        self.inner
            .lock()
            .unwrap()
            .recurring
            .get(elid)
            .map(|info| info.profile.clone())
    }

    pub fn is_deleted(&self, elid: &str) -> bool {
        self.inner.lock().unwrap().deleted.contains(elid)
    }

    pub fn completed_operations(&self) -> Vec<(ServiceCompletion, String)> {
        self.inner.lock().unwrap().completed.clone()
    }

    pub fn operation_error(&self, operation: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .operation_errors
            .get(operation)
            .cloned()
    }

    pub fn is_manual(&self, operation: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .manual_operations
            .contains(operation)
    }

    pub fn tasks(&self) -> Vec<CreatedTask> {
        self.inner.lock().unwrap().tasks.clone()
    }

    /// Logs the call and returns the injected failure, if any.
    fn record(&self, command: &str, elid: &str) -> Result<(), BillingError> {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(CoreCall {
            command: command.to_string(),
            elid: elid.to_string(),
        });
        match state.failures.get(command) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BillingCore for InMemoryBillingCore {
    async fn payment_info(&self, elid: &ElId) -> Result<PaymentRecord, BillingError> {
        self.record("payment.info", elid.as_str())?;
        self.inner
            .lock()
            .unwrap()
            .payments
            .get(elid.as_str())
            .cloned()
            .ok_or_else(|| BillingError::billing_core(format!("payment.info: no payment {}", elid)))
    }

    async fn recurring_info(&self, elid: &ElId) -> Result<RecurringInfo, BillingError> {
        self.record("payment.recurring.info", elid.as_str())?;
        self.inner
            .lock()
            .unwrap()
            .recurring
            .get(elid.as_str())
            .cloned()
            .ok_or_else(|| {
                BillingError::billing_core(format!("payment.recurring.info: no recurring {}", elid))
            })
    }

    async fn apply_transition(
        &self,
        elid: &ElId,
        transition: PaymentTransition,
    ) -> Result<(), BillingError> {
        self.record(transition.command(), elid.as_str())?;
        let mut state = self.inner.lock().unwrap();
        if !state.payments.contains_key(elid.as_str()) {
            return Err(BillingError::billing_core(format!(
                "{}: no payment {}",
                transition.command(),
                elid
            )));
        }
        let previous = state.payment_states.insert(elid.to_string(), transition);
        if previous != Some(transition) {
            state.effective_transitions += 1;
        }
        Ok(())
    }

    async fn delete_payment(&self, elid: &ElId) -> Result<(), BillingError> {
        self.record("payment.delete", elid.as_str())?;
        self.inner.lock().unwrap().deleted.insert(elid.to_string());
        Ok(())
    }

    async fn save_recurring(&self, elid: &ElId, update: ProfileUpdate) -> Result<(), BillingError> {
        let command = if update.status.is_autopayment() {
            "payment.recurring.saveinfo"
        } else {
            "stored_method.save"
        };
        self.record(command, elid.as_str())?;

        let mut state = self.inner.lock().unwrap();
        let info = state
            .recurring
            .get_mut(elid.as_str())
            .ok_or_else(|| BillingError::billing_core(format!("{}: no recurring {}", command, elid)))?;
        info.profile.status = update.status;
        if let Some(token) = update.token {
            info.profile.token = Some(SecretString::new(token.token().to_string()));
            info.profile.token_expiry = Some(token.expire_date());
            info.profile.owner_account_ref = Some(token.account_identifier);
        }
        Ok(())
    }

    async fn complete_service_operation(
        &self,
        completion: ServiceCompletion,
        item: &ElId,
    ) -> Result<(), BillingError> {
        self.record(completion.command(), item.as_str())?;
        self.inner
            .lock()
            .unwrap()
            .completed
            .push((completion, item.to_string()));
        Ok(())
    }

    async fn record_operation_error(
        &self,
        operation: &ElId,
        error_xml: &str,
    ) -> Result<(), BillingError> {
        self.record("runningoperation.edit", operation.as_str())?;
        self.inner
            .lock()
            .unwrap()
            .operation_errors
            .insert(operation.to_string(), error_xml.to_string());
        Ok(())
    }

    async fn set_operation_manual(&self, operation: &ElId) -> Result<(), BillingError> {
        self.record("runningoperation.setmanual", operation.as_str())?;
        self.inner
            .lock()
            .unwrap()
            .manual_operations
            .insert(operation.to_string());
        Ok(())
    }

    async fn task_type(&self, command: &str) -> Result<Option<String>, BillingError> {
        self.record("task.gettype", "")?;
        Ok(self.inner.lock().unwrap().task_types.get(command).cloned())
    }

    async fn create_task(
        &self,
        item: &ElId,
        operation: &ElId,
        task_type: &str,
    ) -> Result<(), BillingError> {
        self.record("task.edit", item.as_str())?;
        self.inner.lock().unwrap().tasks.push(CreatedTask {
            item: item.to_string(),
            operation: operation.to_string(),
            task_type: task_type.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elid(raw: &str) -> ElId {
        ElId::parse("elid", raw).unwrap()
    }

    fn core() -> InMemoryBillingCore {
        InMemoryBillingCore::new().with_payment(PaymentRecord::new(elid("42"), "100.00", "RUB"))
    }

    #[tokio::test]
    async fn repeated_transition_is_idempotent() {
        let core = core();
        core.apply_transition(&elid("42"), PaymentTransition::SetPaid)
            .await
            .unwrap();
        core.apply_transition(&elid("42"), PaymentTransition::SetPaid)
            .await
            .unwrap();

        assert_eq!(core.payment_state("42"), Some(PaymentTransition::SetPaid));
        assert_eq!(core.effective_transitions(), 1);
        assert_eq!(core.call_count("payment.setpaid"), 2);
    }

    #[tokio::test]
    async fn unknown_payment_fails_loudly() {
        let core = core();
        assert!(core.payment_info(&elid("7")).await.is_err());
        assert!(core
            .apply_transition(&elid("7"), PaymentTransition::SetPaid)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn injected_failure_is_returned_and_logged() {
        let core = core();
        core.fail_on("payment.info", BillingError::billing_core("down"));
        assert!(core.payment_info(&elid("42")).await.is_err());
        assert_eq!(core.commands(), vec!["payment.info"]);
    }
}
