//! Outbound provider HTTP port.
//!
//! Providers are called with form-encoded bodies and answer with JSON
//! (PayMaster) or XML (QIWI). The port only moves bytes; decoding the reply
//! is the caller's business, so non-2xx replies are returned, not raised.

use std::fmt;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::BillingError;
use crate::domain::signature::OrderedParams;

/// Port for outbound provider calls.
#[async_trait]
pub trait ProviderHttp: Send + Sync {
    /// Sends one request. Transport failures and timeouts are
    /// [`BillingError::Upstream`].
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BillingError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
    Patch,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Patch => write!(f, "PATCH"),
        }
    }
}

/// HTTP Basic credentials.
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A form-encoded request to a provider.
#[derive(Debug)]
pub struct ProviderRequest {
    pub method: HttpMethod,
    pub url: String,
    pub form: OrderedParams,
    pub basic_auth: Option<BasicAuth>,
}

impl ProviderRequest {
    pub fn post(url: impl Into<String>, form: OrderedParams) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            form,
            basic_auth: None,
        }
    }

    pub fn new(method: HttpMethod, url: impl Into<String>, form: OrderedParams) -> Self {
        Self {
            method,
            url: url.into(),
            form,
            basic_auth: None,
        }
    }

    pub fn with_basic_auth(mut self, auth: BasicAuth) -> Self {
        self.basic_auth = Some(auth);
        self
    }
}

/// Status and body of a provider reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl ProviderResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
