//! Application layer - use cases over the ports.
//!
//! - `callback` - provider callbacks and redirect pages behind `mancgi`
//! - `commands` - CLI commands run by the billing daemon
//! - `recurring` - stored-payment token lifecycle

pub mod callback;
pub mod commands;
pub mod recurring;

mod form;
mod response;

pub use form::AutoSubmitForm;
pub use response::{EndpointResponse, CONTENT_TYPE_HTML, CONTENT_TYPE_XML};
