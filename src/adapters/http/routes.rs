//! Axum router configuration for the callback endpoints.

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{handle_callback, CallbackAppState};

/// Create the callback router.
///
/// # Routes
/// - `GET|POST /mancgi/:name` - provider callbacks and redirect pages,
///   `name` as accepted by the CGI front (`.php` suffix optional)
pub fn callback_router(state: CallbackAppState) -> Router {
    Router::new()
        .route("/mancgi/:name", get(handle_callback).post(handle_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
