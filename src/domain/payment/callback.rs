//! Inbound provider callback as received by a CGI or HTTP front.

use crate::domain::foundation::BillingError;
use crate::domain::signature::OrderedParams;

/// One provider request. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct CallbackEnvelope {
    /// Query and body parameters in arrival order.
    pub raw_params: OrderedParams,
    /// `X-Api-Signature` header.
    pub signature_header: Option<String>,
    /// `Authorization` header.
    pub authorization_header: Option<String>,
    pub source_ip: Option<String>,
    /// `Host` header, used to build absolute redirect URIs.
    pub host: Option<String>,
}

impl CallbackEnvelope {
    pub fn new(raw_params: OrderedParams) -> Self {
        Self {
            raw_params,
            ..Default::default()
        }
    }

    pub fn with_signature(mut self, value: impl Into<String>) -> Self {
        self.signature_header = Some(value.into());
        self
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization_header = Some(value.into());
        self
    }

    pub fn with_host(mut self, value: impl Into<String>) -> Self {
        self.host = Some(value.into());
        self
    }

    /// A parameter, `None` if absent or empty.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.raw_params.get(name).filter(|v| !v.is_empty())
    }

    /// A parameter the request cannot be processed without.
    pub fn require(&self, name: &str) -> Result<&str, BillingError> {
        self.param(name).ok_or_else(|| BillingError::missing(name))
    }

    /// `Host` header, required for building callback URLs.
    pub fn require_host(&self) -> Result<&str, BillingError> {
        self.host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| BillingError::missing("Host"))
    }
}
