//! Inbound provider endpoints.
//!
//! Each handler turns one [`CallbackEnvelope`](crate::domain::payment::CallbackEnvelope)
//! into an [`EndpointResponse`](crate::application::EndpointResponse). No
//! billing state is touched before the request is authenticated.

mod endpoint;
mod paymaster_result;
mod payment_pages;
mod qiwi_notification;
mod recurring_result;

pub use endpoint::{CallbackRouter, Endpoint};
pub use paymaster_result::PayMasterResultHandler;
pub use payment_pages::{PaymentPage, PaymentPageHandler};
pub use qiwi_notification::{QiwiAck, QiwiNotificationHandler};
pub use recurring_result::RecurringResultHandler;
