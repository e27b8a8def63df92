//! HTTP adapter - the `mancgi` endpoints served by axum.
//!
//! Same handlers as the CGI front, for installations that run a
//! long-lived process behind the web server instead of CGI.

mod handlers;
mod routes;

pub use handlers::CallbackAppState;
pub use routes::callback_router;
