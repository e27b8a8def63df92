//! Payments: records, callback envelopes and outcome classification.

mod callback;
mod outcome;
mod record;
mod status_mapper;

pub use callback::CallbackEnvelope;
pub use outcome::{PaymentOutcome, PaymentTransition};
pub use record::{MethodConfig, PaymentRecord, SECRET_SETTINGS};
pub use status_mapper::{classify, has_error_field, map_status, Settlement, StatusVocabulary};
