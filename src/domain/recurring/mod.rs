//! Recurring payments: stored cards, autopayments and their tokens.

mod charge;
mod profile;
mod status;
mod token;

pub use charge::{ChargeInit, TransactionStatus};
pub use profile::{ProfileUpdate, RecurringInfo, RecurringProfile};
pub use status::{AutopaymentStatus, RecurringProfileStatus, SavedCardStatus};
pub use token::{IssuedToken, TokenResponse, TokenState};
