//! XML documents exchanged with the billing core and QIWI.

mod error_document;
mod node;

pub use error_document::ErrorDocument;
pub use node::{XmlNode, XML_DECLARATION};

use thiserror::Error;

use crate::domain::foundation::BillingError;

/// XML decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("unbalanced XML elements")]
    Unbalanced,

    #[error("XML document has no root element")]
    NoRoot,
}

impl From<XmlError> for BillingError {
    fn from(err: XmlError) -> Self {
        BillingError::Validation {
            field: "xml".to_string(),
            value: None,
            reason: err.to_string(),
        }
    }
}
