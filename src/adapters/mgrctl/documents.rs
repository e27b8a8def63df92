//! Typed decoding of the documents `mgrctl` returns.
//!
//! The core repeats some elements: `payment` holds one `paymethod` element
//! with the method id and another with the method settings, and likewise
//! for `currency`. Settings from every repeat are merged.

use crate::adapters::xml::XmlNode;
use crate::domain::foundation::{BillingError, ElId};
use crate::domain::payment::{MethodConfig, PaymentRecord};
use crate::domain::recurring::{RecurringInfo, RecurringProfile, RecurringProfileStatus};

/// Returns the core's error message if the document is an error.
pub fn error_message(doc: &XmlNode) -> Option<String> {
    let error = if doc.name == "error" {
        doc
    } else {
        doc.child("error")?
    };
    let message = error
        .child_text("msg")
        .map(str::to_string)
        .or_else(|| Some(error.text.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| {
            let kind = error.attr("type").unwrap_or("error");
            match error.attr("object") {
                Some(object) => format!("{} ({})", kind, object),
                None => kind.to_string(),
            }
        });
    Some(message)
}

/// Decodes `payment.info`.
pub fn decode_payment(doc: &XmlNode) -> Result<PaymentRecord, BillingError> {
    let payment = doc
        .child("payment")
        .ok_or_else(|| BillingError::billing_core("payment.info returned no payment"))?;
    decode_payment_node(payment)
}

fn decode_payment_node(payment: &XmlNode) -> Result<PaymentRecord, BillingError> {
    let id = ElId::parse("payment.id", payment.child_text("id").unwrap_or_default())?;
    let amount = payment.child_text("paymethodamount").unwrap_or_default();
    let currency = payment
        .children_named("currency")
        .find_map(|c| c.child_text("iso"))
        .unwrap_or_default();

    let mut method = MethodConfig::new();
    for node in payment.children_named("paymethod") {
        for setting in &node.children {
            method.insert(setting.name.as_str(), setting.text.trim());
        }
    }

    let mut record = PaymentRecord::new(id, amount, currency).with_method(method);
    record.status = payment.child_text("status").map(str::to_string);
    record.manager_url = payment.child_text("manager_url").map(str::to_string);
    record.description = payment.child_text("description").map(str::to_string);
    record.number = payment.child_text("number").map(str::to_string);
    record.phone = payment.child_text("phone").map(str::to_string);
    record.project_name = payment
        .child("project")
        .and_then(|p| p.child_text("name"))
        .map(str::to_string);
    record.recurring = match payment.child_text("recurring") {
        Some(raw) => Some(ElId::parse("payment.recurring", raw)?).filter(|id| !id.is_zero()),
        None => None,
    };
    Ok(record)
}

/// Decodes `payment.recurring.info` for the profile `elid`.
pub fn decode_recurring(doc: &XmlNode, elid: &ElId) -> Result<RecurringInfo, BillingError> {
    let recurring = doc
        .child("recurring")
        .ok_or_else(|| BillingError::billing_core("payment.recurring.info returned no recurring"))?;
    let payment = doc
        .child("payment")
        .ok_or_else(|| BillingError::billing_core("payment.recurring.info returned no payment"))?;

    let id = match recurring.child_text("id") {
        Some(raw) => ElId::parse("recurring.id", raw)?,
        None => elid.clone(),
    };
    let status = RecurringProfileStatus::from_code(recurring.child_text("status").unwrap_or_default())?;

    let mut profile = RecurringProfile::new(id, status);
    if let Some(token) = recurring.child_text("token") {
        profile = profile.with_token(token);
    }
    profile.token_expiry = recurring
        .child_text("stored_expire_date")
        .map(str::to_string);
    profile.owner_account_ref = recurring
        .child_text("stored_name")
        .or_else(|| recurring.child_text("data1"))
        .map(str::to_string);

    Ok(RecurringInfo {
        profile,
        payment: decode_payment_node(payment)?,
        max_amount: recurring.child_text("maxamount").unwrap_or("0").to_string(),
    })
}

/// Decodes `task.gettype`.
pub fn decode_task_type(doc: &XmlNode) -> Option<String> {
    doc.child_text("task_type").map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recurring::SavedCardStatus;

    const PAYMENT_INFO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<doc>
  <payment>
    <id>42</id>
    <paymethodamount>100.00</paymethodamount>
    <currency>126</currency>
    <currency><iso>RUB</iso></currency>
    <paymethod>7</paymethod>
    <paymethod>
      <PRV_ID>123</PRV_ID>
      <NOTIFY_PASSWORD>notify-pass</NOTIFY_PASSWORD>
      <API_ID>55</API_ID>
      <API_PASSWORD>api-pass</API_PASSWORD>
    </paymethod>
    <manager_url>https://billing.example.com/billmgr</manager_url>
    <description>Invoice #42</description>
    <number>42-A</number>
    <phone>+7 (900) 000-00-00</phone>
    <project><name>Example Hosting</name></project>
    <recurring>0</recurring>
  </payment>
</doc>"#;

    #[test]
    fn decodes_payment_with_repeated_nodes() {
        let record = decode_payment(&XmlNode::parse(PAYMENT_INFO).unwrap()).unwrap();

        assert_eq!(record.id.as_str(), "42");
        assert_eq!(record.amount, "100.00");
        assert_eq!(record.currency, "RUB");
        assert_eq!(record.method.value("PRV_ID"), Some("123"));
        assert_eq!(record.method.secret("NOTIFY_PASSWORD").unwrap(), "notify-pass");
        assert_eq!(record.manager_url.as_deref(), Some("https://billing.example.com/billmgr"));
        assert_eq!(record.project_name.as_deref(), Some("Example Hosting"));
        assert_eq!(record.recurring, None);
    }

    #[test]
    fn payment_without_id_is_rejected() {
        let doc = XmlNode::parse("<doc><payment><paymethodamount>1</paymethodamount></payment></doc>").unwrap();
        assert!(decode_payment(&doc).is_err());
    }

    #[test]
    fn decodes_saved_card_recurring_info() {
        let doc = XmlNode::parse(
            r#"<doc>
                 <recurring><id>9</id><status>3</status><maxamount>1500</maxamount></recurring>
                 <payment>
                   <id>42</id>
                   <currency><iso>RUB</iso></currency>
                   <paymethod><LMI_MERCHANT_ID>m-1</LMI_MERCHANT_ID><direct_secret>ds</direct_secret></paymethod>
                 </payment>
               </doc>"#,
        )
        .unwrap();
        let elid = ElId::parse("elid", "9").unwrap();
        let info = decode_recurring(&doc, &elid).unwrap();

        assert_eq!(
            info.profile.status,
            RecurringProfileStatus::SavedCard(SavedCardStatus::Storing)
        );
        assert_eq!(info.limits(), "1500;1500;1500");
        assert_eq!(info.payment.method.secret("direct_secret").unwrap(), "ds");
        assert!(info.profile.token.is_none());
    }

    #[test]
    fn recurring_with_unknown_status_is_rejected() {
        let doc = XmlNode::parse(
            "<doc><recurring><status>8</status></recurring><payment><id>1</id></payment></doc>",
        )
        .unwrap();
        let elid = ElId::parse("elid", "1").unwrap();
        assert!(decode_recurring(&doc, &elid).is_err());
    }

    #[test]
    fn error_message_prefers_msg_element() {
        let doc = XmlNode::parse(
            r#"<doc><error type="missed" object="elid"><msg>Payment not found</msg></error></doc>"#,
        )
        .unwrap();
        assert_eq!(error_message(&doc).as_deref(), Some("Payment not found"));

        let doc = XmlNode::parse(r#"<doc><error type="missed" object="elid"/></doc>"#).unwrap();
        assert_eq!(error_message(&doc).as_deref(), Some("missed (elid)"));

        assert_eq!(error_message(&XmlNode::doc()), None);
    }

    #[test]
    fn task_type_is_optional() {
        let doc = XmlNode::parse("<doc><task_type>domain_open</task_type></doc>").unwrap();
        assert_eq!(decode_task_type(&doc).as_deref(), Some("domain_open"));
        assert_eq!(decode_task_type(&XmlNode::doc()), None);
    }
}
