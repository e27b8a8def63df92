//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `BillingCore` - the billing system's control interface
//! - `ProviderHttp` - outbound calls to payment providers
//! - `Clock` - current time

mod billing_core;
mod clock;
mod provider_http;

pub use billing_core::{BillingCore, ServiceCompletion};
pub use clock::{Clock, FixedClock, SystemClock};
pub use provider_http::{BasicAuth, HttpMethod, ProviderHttp, ProviderRequest, ProviderResponse};
