//! Recurring profile status vocabularies.
//!
//! Two vocabularies share one numeric column in the billing core:
//!
//! | Code | Vocabulary  | Meaning    |
//! |------|-------------|------------|
//! | 0    | autopayment | Adding     |
//! | 1    | autopayment | Active     |
//! | 2    | autopayment | Closed     |
//! | 3    | saved card  | Storing    |
//! | 4    | saved card  | Stored     |
//! | 5    | saved card  | Disabled   |
//! | 6    | saved card  | Restoring  |
//! | 10   | saved card  | Error      |
//!
//! The workflow that created a profile fixes its vocabulary. A profile never
//! moves between vocabularies, so the codes are kept in separate enums.

use std::fmt;

use crate::domain::foundation::{BillingError, StateMachine};

/// Legacy auto-recharge profile status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutopaymentStatus {
    Adding,
    Active,
    Closed,
}

impl AutopaymentStatus {
    pub fn code(&self) -> u8 {
        match self {
            AutopaymentStatus::Adding => 0,
            AutopaymentStatus::Active => 1,
            AutopaymentStatus::Closed => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AutopaymentStatus::Adding),
            1 => Some(AutopaymentStatus::Active),
            2 => Some(AutopaymentStatus::Closed),
            _ => None,
        }
    }
}

impl StateMachine for AutopaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AutopaymentStatus::*;
        matches!(
            (self, target),
            (Adding, Active)
                | (Adding, Closed)
                // Re-authorization refreshes the token
                | (Active, Active)
                | (Active, Closed)
                | (Closed, Adding)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AutopaymentStatus::*;
        match self {
            Adding => vec![Active, Closed],
            Active => vec![Active, Closed],
            Closed => vec![Adding],
        }
    }
}

/// Saved payment method status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SavedCardStatus {
    Storing,
    Stored,
    Disabled,
    Restoring,
    Error,
}

impl SavedCardStatus {
    pub fn code(&self) -> u8 {
        match self {
            SavedCardStatus::Storing => 3,
            SavedCardStatus::Stored => 4,
            SavedCardStatus::Disabled => 5,
            SavedCardStatus::Restoring => 6,
            SavedCardStatus::Error => 10,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            3 => Some(SavedCardStatus::Storing),
            4 => Some(SavedCardStatus::Stored),
            5 => Some(SavedCardStatus::Disabled),
            6 => Some(SavedCardStatus::Restoring),
            10 => Some(SavedCardStatus::Error),
            _ => None,
        }
    }
}

impl StateMachine for SavedCardStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SavedCardStatus::*;
        matches!(
            (self, target),
            (Storing, Stored)
                | (Storing, Error)
                | (Stored, Disabled)
                | (Stored, Restoring)
                | (Restoring, Stored)
                | (Restoring, Error)
                | (Error, Restoring)
                | (Disabled, Restoring)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SavedCardStatus::*;
        match self {
            Storing => vec![Stored, Error],
            Stored => vec![Disabled, Restoring],
            Restoring => vec![Stored, Error],
            Error => vec![Restoring],
            Disabled => vec![Restoring],
        }
    }
}

/// Status of a recurring profile in whichever vocabulary created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecurringProfileStatus {
    Autopayment(AutopaymentStatus),
    SavedCard(SavedCardStatus),
}

impl RecurringProfileStatus {
    /// Decodes the numeric status column.
    pub fn from_code(raw: &str) -> Result<Self, BillingError> {
        let code: u8 = raw
            .trim()
            .parse()
            .map_err(|_| BillingError::invalid_value("status", raw, "not a recurring status code"))?;

        AutopaymentStatus::from_code(code)
            .map(RecurringProfileStatus::Autopayment)
            .or_else(|| SavedCardStatus::from_code(code).map(RecurringProfileStatus::SavedCard))
            .ok_or_else(|| BillingError::invalid_value("status", raw, "unknown recurring status code"))
    }

    pub fn code(&self) -> u8 {
        match self {
            RecurringProfileStatus::Autopayment(s) => s.code(),
            RecurringProfileStatus::SavedCard(s) => s.code(),
        }
    }

    pub fn is_autopayment(&self) -> bool {
        matches!(self, RecurringProfileStatus::Autopayment(_))
    }

    /// True when the profile holds a usable token.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RecurringProfileStatus::Autopayment(AutopaymentStatus::Active)
                | RecurringProfileStatus::SavedCard(SavedCardStatus::Stored)
        )
    }

    /// The "token stored" status in this profile's vocabulary.
    pub fn stored(&self) -> Self {
        match self {
            RecurringProfileStatus::Autopayment(_) => {
                RecurringProfileStatus::Autopayment(AutopaymentStatus::Active)
            }
            RecurringProfileStatus::SavedCard(_) => {
                RecurringProfileStatus::SavedCard(SavedCardStatus::Stored)
            }
        }
    }

    /// The "token revoked" status in this profile's vocabulary.
    pub fn closed(&self) -> Self {
        match self {
            RecurringProfileStatus::Autopayment(_) => {
                RecurringProfileStatus::Autopayment(AutopaymentStatus::Closed)
            }
            RecurringProfileStatus::SavedCard(_) => {
                RecurringProfileStatus::SavedCard(SavedCardStatus::Disabled)
            }
        }
    }
}

impl StateMachine for RecurringProfileStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use RecurringProfileStatus::*;
        match (self, target) {
            (Autopayment(from), Autopayment(to)) => from.can_transition_to(to),
            (SavedCard(from), SavedCard(to)) => from.can_transition_to(to),
            _ => false,
        }
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            RecurringProfileStatus::Autopayment(s) => s
                .valid_transitions()
                .into_iter()
                .map(RecurringProfileStatus::Autopayment)
                .collect(),
            RecurringProfileStatus::SavedCard(s) => s
                .valid_transitions()
                .into_iter()
                .map(RecurringProfileStatus::SavedCard)
                .collect(),
        }
    }
}

impl fmt::Display for RecurringProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
