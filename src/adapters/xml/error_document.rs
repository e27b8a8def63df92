//! Renders a [`BillingError`] as the `<error>` document the billing daemon reads.

use super::XmlNode;
use crate::domain::foundation::BillingError;

/// `<doc><error type=".." [object=".."] [value=".."]>[<param ..>]</error></doc>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDocument {
    pub error_type: String,
    pub object: Option<String>,
    pub value: Option<String>,
    pub params: Vec<(String, String)>,
}

impl ErrorDocument {
    pub fn new(error_type: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            object: None,
            value: None,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn to_node(&self) -> XmlNode {
        let mut error = XmlNode::new("error").with_attr("type", self.error_type.as_str());
        if let Some(object) = &self.object {
            error.set_attr("object", object.as_str());
        }
        if let Some(value) = &self.value {
            error.set_attr("value", value.as_str());
        }
        for (name, value) in &self.params {
            error.children.push(
                XmlNode::new("param")
                    .with_attr("name", name.as_str())
                    .with_text(value.as_str()),
            );
        }
        XmlNode::doc().with_child(error)
    }

    pub fn render(&self) -> String {
        self.to_node().to_document()
    }
}

impl From<&BillingError> for ErrorDocument {
    fn from(err: &BillingError) -> Self {
        let mut doc = ErrorDocument::new(err.error_type());
        doc.object = err.object().map(str::to_string);
        match err {
            BillingError::Validation { value, .. } => doc.value = value.clone(),
            BillingError::PaymentProcess(message)
            | BillingError::Authentication(message)
            | BillingError::Integrity(message) => {
                doc.params.push(("error_msg".to_string(), message.clone()));
            }
            BillingError::Upstream { message, .. } => {
                doc.params.push(("error_msg".to_string(), message.clone()));
            }
            BillingError::Configuration { reason, .. } => {
                doc.params.push(("error_msg".to_string(), reason.clone()));
            }
            BillingError::UnknownCommand(_) => {}
        }
        doc
    }
}
