//! Visitor category enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why the visitor is on site.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "visitor_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VisitorType {
    /// Relative of a resident.
    Family,
    /// Friend of a resident.
    Friend,
    /// Visiting clinician, GP, or therapist.
    Healthcare,
    /// Tradesperson or supplier.
    Contractor,
    /// Volunteer helper.
    Volunteer,
    /// Anything else.
    #[default]
    Other,
}

impl VisitorType {
    /// All visitor types in display order.
    pub fn all() -> [VisitorType; 6] {
        [
            Self::Family,
            Self::Friend,
            Self::Healthcare,
            Self::Contractor,
            Self::Volunteer,
            Self::Other,
        ]
    }

    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Friend => "friend",
            Self::Healthcare => "healthcare",
            Self::Contractor => "contractor",
            Self::Volunteer => "volunteer",
            Self::Other => "other",
        }
    }

    /// Whether the visit is tied to a specific resident.
    pub fn visits_resident(&self) -> bool {
        matches!(self, Self::Family | Self::Friend | Self::Healthcare)
    }
}

impl fmt::Display for VisitorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VisitorType {
    type Err = visitdesk_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "family" => Ok(Self::Family),
            "friend" => Ok(Self::Friend),
            "healthcare" => Ok(Self::Healthcare),
            "contractor" => Ok(Self::Contractor),
            "volunteer" => Ok(Self::Volunteer),
            "other" => Ok(Self::Other),
            _ => Err(visitdesk_core::AppError::validation(format!(
                "Invalid visitor type: '{s}'"
            ))),
        }
    }
}
