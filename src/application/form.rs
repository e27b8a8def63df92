//! Auto-submitting HTML forms that hand the customer over to a provider.

use quick_xml::escape::escape;

use crate::domain::signature::OrderedParams;

/// A hidden-field form posted to `action` as soon as the page loads.
///
/// Every value is HTML-escaped; field order is preserved so signed payloads
/// reach the provider exactly as they were signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSubmitForm {
    pub action: String,
    pub fields: OrderedParams,
}

impl AutoSubmitForm {
    pub fn new(action: impl Into<String>, fields: OrderedParams) -> Self {
        Self {
            action: action.into(),
            fields,
        }
    }

    pub fn render(&self) -> String {
        let inputs: Vec<String> = self
            .fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "    <input type='hidden' name='{}' value='{}'/>",
                    escape(name),
                    escape(value)
                )
            })
            .collect();

        format!(
            "<html>\n\
             <head>\n\
             \t<meta http-equiv='Content-Type' content='text/html; charset=UTF-8' />\n\
             \t<script language='JavaScript'>\n\
             \t\tfunction DoSubmit() {{\n\
             \t\t\tdocument.payform.submit();\n\
             \t\t}}\n\
             \t</script>\n\
             </head>\n\
             <body onload='DoSubmit()'>\n\
             \t<form name='payform' action='{}' method='post'>\n\
             {}\n\
             \t</form>\n\
             </body>\n\
             </html>\n",
            escape(self.action.as_str()),
            inputs.join("\n")
        )
    }
}
