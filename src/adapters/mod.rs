//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the plugins to external systems:
//! - `mgrctl` - billing core through the control utility
//! - `provider` - provider APIs over reqwest
//! - `memory` - in-memory core and scripted provider for tests
//! - `xml` - documents exchanged with the core and QIWI
//! - `cgi` / `http` - inbound fronts for the callback endpoints

pub mod cgi;
pub mod http;
pub mod memory;
pub mod mgrctl;
pub mod provider;
pub mod xml;

pub use memory::{InMemoryBillingCore, ScriptedProviderHttp};
pub use mgrctl::MgrctlBillingCore;
pub use provider::ReqwestProviderClient;
