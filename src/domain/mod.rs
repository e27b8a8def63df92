//! Domain layer: pure types and rules, no I/O.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, amounts, errors, state machine trait)
//! - `signature` - Provider signature codecs
//! - `payment` - Payment records, callback envelopes, status classification
//! - `recurring` - Stored cards, autopayments and the token lifecycle states

pub mod foundation;
pub mod payment;
pub mod recurring;
pub mod signature;
