//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, money, the error taxonomy and the state machine
//! trait that form the vocabulary of every plugin.

mod errors;
mod ids;
mod money;
mod state_machine;

pub use errors::{BillingError, Upstream};
pub use ids::ElId;
pub use money::Amount;
pub use state_machine::StateMachine;
