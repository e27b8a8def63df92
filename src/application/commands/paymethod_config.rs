//! The `config` document a payment method module answers with.

use crate::adapters::xml::XmlNode;

/// Feature flags and parameters advertised to the billing daemon.
///
/// Renders as `<doc><feature><redirect>on</redirect>..</feature><param>..</param></doc>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymethodConfig {
    features: Vec<&'static str>,
    params: Vec<(&'static str, String)>,
}

impl PaymethodConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature(mut self, name: &'static str) -> Self {
        self.features.push(name);
        self
    }

    pub fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    pub fn to_node(&self) -> XmlNode {
        let mut feature = XmlNode::new("feature");
        for name in &self.features {
            feature.children.push(XmlNode::new(*name).with_text("on"));
        }
        let mut param = XmlNode::new("param");
        for (name, value) in &self.params {
            param.children.push(XmlNode::new(*name).with_text(value.as_str()));
        }
        XmlNode::doc().with_child(feature).with_child(param)
    }
}
