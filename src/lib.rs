//! Billing platform plugins
//!
//! Payment-method modules (PayMaster, QIWI pull bills, paycgi) and a domain
//! registrar processing module. Providers call back through signed
//! notifications; verified outcomes are applied to the billing core through
//! its control utility.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod plugin;
pub mod ports;
