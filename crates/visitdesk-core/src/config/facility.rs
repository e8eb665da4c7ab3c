//! Facility and visiting-policy configuration.

use serde::{Deserialize, Serialize};

/// Settings describing the care facility and its visiting rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityConfig {
    /// Facility display name, printed on exports and badges.
    #[serde(default = "default_name")]
    pub name: String,
    /// Visits longer than this are flagged as overdue.
    #[serde(default = "default_max_visit_hours")]
    pub max_visit_hours: i64,
    /// Whether a health screening must accompany every check-in.
    #[serde(default = "default_true")]
    pub require_health_screening: bool,
    /// Whether a failed screening blocks the check-in.
    #[serde(default = "default_true")]
    pub block_failed_screening: bool,
    /// Body temperature at or above which a screening fails.
    #[serde(default = "default_temperature_threshold")]
    pub temperature_threshold_celsius: f64,
    /// Longest date range, in days, a summary report may cover.
    #[serde(default = "default_max_report_days")]
    pub max_report_days: i64,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_visit_hours: default_max_visit_hours(),
            require_health_screening: default_true(),
            block_failed_screening: default_true(),
            temperature_threshold_celsius: default_temperature_threshold(),
            max_report_days: default_max_report_days(),
        }
    }
}

fn default_name() -> String {
    "VisitDesk Care Home".to_string()
}

fn default_max_visit_hours() -> i64 {
    4
}

fn default_true() -> bool {
    true
}

fn default_temperature_threshold() -> f64 {
    37.5
}

fn default_max_report_days() -> i64 {
    366
}
