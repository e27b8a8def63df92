//! Payment outcomes and the billing core transitions they select.

use serde::{Deserialize, Serialize};

/// Provider-independent classification of a payment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Paid,
    InProgress,
    Declined,
    Error,
}

impl PaymentOutcome {
    /// Transition applied for a provider notification.
    ///
    /// `Error` selects nothing: the payment is left untouched.
    pub fn callback_transition(&self) -> Option<PaymentTransition> {
        match self {
            PaymentOutcome::Paid => Some(PaymentTransition::SetPaid),
            PaymentOutcome::InProgress => Some(PaymentTransition::SetInPay),
            PaymentOutcome::Declined => Some(PaymentTransition::SetNoPay),
            PaymentOutcome::Error => None,
        }
    }

    /// Transition applied after a merchant-initiated charge of a stored token.
    ///
    /// A declined charge cancels the payment instead of marking it unpaid.
    pub fn charge_transition(&self) -> Option<PaymentTransition> {
        match self {
            PaymentOutcome::Declined => Some(PaymentTransition::SetCanceled),
            other => other.callback_transition(),
        }
    }
}

/// Payment state changes the billing core accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTransition {
    SetPaid,
    SetInPay,
    SetNoPay,
    SetCanceled,
}

impl PaymentTransition {
    /// Control utility function name.
    pub fn command(&self) -> &'static str {
        match self {
            PaymentTransition::SetPaid => "payment.setpaid",
            PaymentTransition::SetInPay => "payment.setinpay",
            PaymentTransition::SetNoPay => "payment.setnopay",
            PaymentTransition::SetCanceled => "payment.setcanceled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_outcomes_select_one_transition_each() {
        assert_eq!(
            PaymentOutcome::Paid.callback_transition(),
            Some(PaymentTransition::SetPaid)
        );
        assert_eq!(
            PaymentOutcome::InProgress.callback_transition(),
            Some(PaymentTransition::SetInPay)
        );
        assert_eq!(
            PaymentOutcome::Declined.callback_transition(),
            Some(PaymentTransition::SetNoPay)
        );
        assert_eq!(PaymentOutcome::Error.callback_transition(), None);
    }

    #[test]
    fn declined_charge_cancels() {
        assert_eq!(
            PaymentOutcome::Declined.charge_transition(),
            Some(PaymentTransition::SetCanceled)
        );
        assert_eq!(
            PaymentOutcome::Paid.charge_transition(),
            Some(PaymentTransition::SetPaid)
        );
        assert_eq!(PaymentOutcome::Error.charge_transition(), None);
    }

    #[test]
    fn commands_match_control_utility_names() {
        assert_eq!(PaymentTransition::SetPaid.command(), "payment.setpaid");
        assert_eq!(PaymentTransition::SetInPay.command(), "payment.setinpay");
        assert_eq!(PaymentTransition::SetNoPay.command(), "payment.setnopay");
        assert_eq!(PaymentTransition::SetCanceled.command(), "payment.setcanceled");
    }
}
