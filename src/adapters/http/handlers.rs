//! HTTP handlers for provider callbacks.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, RawQuery, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapters::cgi::merge_params;
use crate::application::callback::{CallbackRouter, Endpoint};
use crate::application::EndpointResponse;
use crate::domain::payment::CallbackEnvelope;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state: the callback router built once at startup.
#[derive(Clone)]
pub struct CallbackAppState {
    pub router: Arc<CallbackRouter>,
}

impl CallbackAppState {
    pub fn new(router: CallbackRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// `GET|POST /mancgi/:name`
pub async fn handle_callback(
    State(state): State<CallbackAppState>,
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let endpoint = match Endpoint::from_name(&name) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            tracing::warn!(name = %name, "Unknown callback endpoint");
            return to_http(EndpointResponse::error(&e));
        }
    };

    let body = String::from_utf8_lossy(&body);
    let mut envelope = CallbackEnvelope::new(merge_params(query.as_deref(), Some(body.as_ref())));
    envelope.signature_header = header_value(&headers, "x-api-signature");
    envelope.authorization_header = header_value(&headers, header::AUTHORIZATION.as_str());
    envelope.host = header_value(&headers, header::HOST.as_str());
    envelope.source_ip = header_value(&headers, "x-real-ip")
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()));

    to_http(state.router.dispatch(endpoint, &envelope).await)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Converts an endpoint reply into an axum response.
fn to_http(reply: EndpointResponse) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, reply.body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(reply.content_type));
    if let Some(location) = reply.location {
        match HeaderValue::from_str(&location) {
            Ok(value) => {
                headers.insert(header::LOCATION, value);
            }
            Err(_) => tracing::error!(location = %location, "Redirect target is not a valid header"),
        }
    }
    response
}
