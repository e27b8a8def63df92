//! `reqwest` implementation of the provider HTTP port.
//!
//! Bodies are encoded with PHP `http_build_query` rules so the bytes on the
//! wire are exactly the ones the direct-API signature was computed over.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;

use crate::domain::foundation::BillingError;
use crate::ports::{HttpMethod, ProviderHttp, ProviderRequest, ProviderResponse};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Provider client with a bounded per-request timeout.
pub struct ReqwestProviderClient {
    http_client: reqwest::Client,
}

impl ReqwestProviderClient {
    pub fn new(timeout: Duration) -> Result<Self, BillingError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BillingError::configuration("http", e.to_string()))?;
        Ok(Self { http_client })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
    }
}

#[async_trait]
impl ProviderHttp for ReqwestProviderClient {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BillingError> {
        let ProviderRequest {
            method,
            url,
            form,
            basic_auth,
        } = request;

        tracing::debug!(%method, url = %url, fields = form.len(), "Calling provider");

        let mut builder = self
            .http_client
            .request(to_reqwest_method(method), &url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form.to_query_string());
        if let Some(auth) = &basic_auth {
            builder = builder.basic_auth(&auth.username, Some(auth.password()));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::error!(url = %url, "Provider call timed out");
                BillingError::provider(format!("{} {} timed out", method, url))
            } else {
                tracing::error!(url = %url, error = %e, "Provider call failed");
                BillingError::provider(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| BillingError::provider(format!("unreadable provider reply: {}", e)))?;

        tracing::debug!(url = %url, status, body = %body, "Provider replied");
        Ok(ProviderResponse { status, body })
    }
}
