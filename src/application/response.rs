//! What an endpoint sends back to its HTTP caller.

use crate::adapters::xml::ErrorDocument;
use crate::domain::foundation::BillingError;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=UTF-8";
pub const CONTENT_TYPE_XML: &str = "text/xml; charset=UTF-8";

/// Status, headers and body of a callback or redirect page reply.
///
/// Fronts (CGI, axum) translate this one-to-one into their own response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub location: Option<String>,
    pub body: String,
}

impl EndpointResponse {
    /// `200` with an empty body.
    pub fn empty() -> Self {
        Self::html(String::new())
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_HTML,
            location: None,
            body: body.into(),
        }
    }

    pub fn xml(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_XML,
            location: None,
            body: body.into(),
        }
    }

    /// `302` to `url`.
    pub fn redirect(url: impl Into<String>) -> Self {
        Self {
            status: 302,
            content_type: CONTENT_TYPE_HTML,
            location: Some(url.into()),
            body: String::new(),
        }
    }

    /// Error document with the status matching the error's retry semantics.
    pub fn error(err: &BillingError) -> Self {
        Self {
            status: err.status_code(),
            content_type: CONTENT_TYPE_XML,
            location: None,
            body: ErrorDocument::from(err).render(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_uses_error_status_and_document() {
        let response = EndpointResponse::error(&BillingError::billing_core("down"));
        assert_eq!(response.status, 502);
        assert_eq!(response.content_type, CONTENT_TYPE_XML);
        assert!(response.body.contains("<error type=\"upstream\""));
        assert!(!response.is_success());
    }

    #[test]
    fn redirect_carries_location() {
        let response = EndpointResponse::redirect("https://my.example/billmgr?func=x");
        assert_eq!(response.status, 302);
        assert_eq!(response.location.as_deref(), Some("https://my.example/billmgr?func=x"));
        assert!(response.is_success());
    }
}
