//! CGI front for `mancgi`.
//!
//! The web server passes request metadata in environment variables and
//! the body on stdin. Parameters come from `QUERY_STRING` and, for `POST`,
//! the urlencoded body; body values win on duplicate keys.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::application::EndpointResponse;
use crate::domain::foundation::BillingError;
use crate::domain::payment::CallbackEnvelope;
use crate::domain::signature::OrderedParams;

/// One decoded CGI request.
#[derive(Debug, Clone)]
pub struct CgiRequest {
    /// Basename of `SCRIPT_NAME`, which selects the endpoint.
    pub script: String,
    pub envelope: CallbackEnvelope,
}

impl CgiRequest {
    /// Decodes the CGI variables. `body` is only read for `POST`.
    pub fn from_env<I>(vars: I, body: &str) -> Result<Self, BillingError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let var = |name: &str| vars.get(name).map(String::as_str).filter(|v| !v.is_empty());

        let script = var("SCRIPT_NAME")
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BillingError::missing("SCRIPT_NAME"))?
            .to_string();

        let is_post = var("REQUEST_METHOD").is_some_and(|m| m.eq_ignore_ascii_case("POST"));
        let params = merge_params(var("QUERY_STRING"), is_post.then_some(body));

        let mut envelope = CallbackEnvelope::new(params);
        envelope.signature_header = var("HTTP_X_API_SIGNATURE").map(str::to_string);
        envelope.authorization_header = var("HTTP_AUTHORIZATION")
            .or_else(|| var("REDIRECT_HTTP_AUTHORIZATION"))
            .map(str::to_string);
        envelope.source_ip = var("REMOTE_ADDR").map(str::to_string);
        envelope.host = var("HTTP_HOST").map(str::to_string);

        Ok(Self { script, envelope })
    }
}

/// Query parameters overlaid with body parameters.
pub fn merge_params(query: Option<&str>, body: Option<&str>) -> OrderedParams {
    let mut params = query.map(OrderedParams::from_urlencoded).unwrap_or_default();
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        params.extend_from(OrderedParams::from_urlencoded(body));
    }
    params
}

/// Writes the CGI response headers and body.
pub fn write_response(out: &mut impl Write, response: &EndpointResponse) -> io::Result<()> {
    let reason = http::StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("");
    write!(out, "Status: {} {}\r\n", response.status, reason)?;
    if let Some(location) = &response.location {
        write!(out, "Location: {}\r\n", location)?;
    }
    write!(out, "Content-Type: {}\r\n\r\n", response.content_type)?;
    out.write_all(response.body.as_bytes())?;
    out.flush()
}
