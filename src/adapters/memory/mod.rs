//! In-memory adapters for tests and local runs.

mod billing_core;
mod provider_http;

pub use billing_core::{CoreCall, CreatedTask, InMemoryBillingCore};
pub use provider_http::{RecordedRequest, ScriptedProviderHttp};
