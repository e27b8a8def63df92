//! Recurring payment use cases.

mod token_lifecycle;

pub use token_lifecycle::{AuthorizationOutcome, TokenLifecycleManager, RECURRING_RESULT_PATH};
