//! Outbound provider HTTP adapters.

mod reqwest_client;

pub use reqwest_client::ReqwestProviderClient;
