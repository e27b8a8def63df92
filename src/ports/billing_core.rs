//! Billing core port.
//!
//! The only channel back to the billing system of record. Every method maps
//! to one control utility function; implementations decode the returned
//! document into the typed records below.
//!
//! # Idempotency
//!
//! The core deduplicates on `(elid, command)`. Callers may repeat any call
//! after an ambiguous failure without changing the final state.

use async_trait::async_trait;

use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::{PaymentRecord, PaymentTransition};
use crate::domain::recurring::{ProfileUpdate, RecurringInfo};

/// Port for the billing core's control interface.
#[async_trait]
pub trait BillingCore: Send + Sync {
    /// `payment.info`
    async fn payment_info(&self, elid: &ElId) -> Result<PaymentRecord, BillingError>;

    /// `payment.recurring.info`
    async fn recurring_info(&self, elid: &ElId) -> Result<RecurringInfo, BillingError>;

    /// `payment.setpaid` / `setinpay` / `setnopay` / `setcanceled`
    async fn apply_transition(
        &self,
        elid: &ElId,
        transition: PaymentTransition,
    ) -> Result<(), BillingError>;

    /// `payment.delete`
    async fn delete_payment(&self, elid: &ElId) -> Result<(), BillingError>;

    /// `stored_method.save` or `payment.recurring.saveinfo`, chosen by the
    /// vocabulary of `update.status`.
    async fn save_recurring(&self, elid: &ElId, update: ProfileUpdate)
        -> Result<(), BillingError>;

    /// Reports a finished service operation (`domain.open`, `service.post*`).
    async fn complete_service_operation(
        &self,
        completion: ServiceCompletion,
        item: &ElId,
    ) -> Result<(), BillingError>;

    /// `runningoperation.edit` with the rendered error document.
    async fn record_operation_error(
        &self,
        operation: &ElId,
        error_xml: &str,
    ) -> Result<(), BillingError>;

    /// `runningoperation.setmanual`
    async fn set_operation_manual(&self, operation: &ElId) -> Result<(), BillingError>;

    /// `task.gettype`; `None` when the core has no task type for the command.
    async fn task_type(&self, command: &str) -> Result<Option<String>, BillingError>;

    /// `task.edit`
    async fn create_task(
        &self,
        item: &ElId,
        operation: &ElId,
        task_type: &str,
    ) -> Result<(), BillingError>;
}

/// Completion notices a processing module sends for a service item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceCompletion {
    DomainOpen,
    Suspend,
    Resume,
    Close,
    SetParam,
    Prolong,
}

impl ServiceCompletion {
    pub fn command(&self) -> &'static str {
        match self {
            ServiceCompletion::DomainOpen => "domain.open",
            ServiceCompletion::Suspend => "service.postsuspend",
            ServiceCompletion::Resume => "service.postresume",
            ServiceCompletion::Close => "service.postclose",
            ServiceCompletion::SetParam => "service.postsetparam",
            ServiceCompletion::Prolong => "service.postprolong",
        }
    }
}
