//! Visitor status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a visitor record stands in the visit lifecycle.
///
/// Valid transitions: `checked_in -> checked_out` and
/// `checked_in -> evacuated`. Both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "visitor_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VisitorStatus {
    /// Currently on site.
    CheckedIn,
    /// Left through the front desk.
    CheckedOut,
    /// Removed from site during an emergency evacuation.
    Evacuated,
}

impl VisitorStatus {
    /// Whether the visitor is still on the premises.
    pub fn is_on_site(&self) -> bool {
        matches!(self, Self::CheckedIn)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: VisitorStatus) -> bool {
        matches!(
            (self, next),
            (Self::CheckedIn, Self::CheckedOut) | (Self::CheckedIn, Self::Evacuated)
        )
    }

    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckedIn => "checked_in",
            Self::CheckedOut => "checked_out",
            Self::Evacuated => "evacuated",
        }
    }
}

impl fmt::Display for VisitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VisitorStatus {
    type Err = visitdesk_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "checked_in" => Ok(Self::CheckedIn),
            "checked_out" => Ok(Self::CheckedOut),
            "evacuated" => Ok(Self::Evacuated),
            _ => Err(visitdesk_core::AppError::validation(format!(
                "Invalid visitor status: '{s}'. Expected one of: checked_in, checked_out, evacuated"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_checked_in_moves() {
        assert!(VisitorStatus::CheckedIn.can_transition_to(VisitorStatus::CheckedOut));
        assert!(VisitorStatus::CheckedIn.can_transition_to(VisitorStatus::Evacuated));
        assert!(!VisitorStatus::CheckedOut.can_transition_to(VisitorStatus::Evacuated));
        assert!(!VisitorStatus::Evacuated.can_transition_to(VisitorStatus::CheckedOut));
        assert!(!VisitorStatus::CheckedIn.can_transition_to(VisitorStatus::CheckedIn));
    }

    #[test]
    fn parses_dashed_form() {
        assert_eq!(
            "checked-out".parse::<VisitorStatus>().unwrap(),
            VisitorStatus::CheckedOut
        );
        assert!("gone".parse::<VisitorStatus>().is_err());
    }
}
