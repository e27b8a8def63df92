//! Billing core adapter over the `mgrctl` control utility.

mod client;
mod documents;

pub use client::MgrctlBillingCore;
pub use documents::{decode_payment, decode_recurring, error_message};
