//! Health screening recorded at check-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Answers to the entry health questionnaire.
///
/// Stored as a JSON sub-document on the visitor row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthScreening {
    /// Measured body temperature, if taken.
    #[serde(default)]
    pub temperature_celsius: Option<f64>,
    /// Visitor reports cough, fever, vomiting, or similar.
    #[serde(default)]
    pub has_symptoms: bool,
    /// Contact with a confirmed infectious case in the last 14 days.
    #[serde(default)]
    pub recent_exposure: bool,
    /// Travel abroad in the last 14 days. Informational only.
    #[serde(default)]
    pub recent_travel: bool,
    /// When the questionnaire was completed (`None` = not screened).
    #[serde(default)]
    pub screened_at: Option<DateTime<Utc>>,
    /// Outcome computed by [`HealthScreening::evaluate`].
    #[serde(default)]
    pub passed: bool,
}

impl HealthScreening {
    /// Whether a questionnaire was actually completed.
    pub fn is_screened(&self) -> bool {
        self.screened_at.is_some()
    }

    /// Reasons the screening fails, empty when it passes.
    pub fn failure_reasons(&self, threshold_celsius: f64) -> Vec<String> {
        let mut reasons = Vec::new();
        if let Some(t) = self.temperature_celsius {
            if t >= threshold_celsius {
                reasons.push(format!(
                    "temperature {t:.1}°C at or above {threshold_celsius:.1}°C"
                ));
            }
        }
        if self.has_symptoms {
            reasons.push("reported symptoms".to_string());
        }
        if self.recent_exposure {
            reasons.push("recent exposure to an infectious case".to_string());
        }
        reasons
    }

    /// Stamp the screening time and compute `passed`. Returns the outcome.
    pub fn evaluate(&mut self, threshold_celsius: f64, at: DateTime<Utc>) -> bool {
        self.screened_at = Some(at);
        self.passed = self.failure_reasons(threshold_celsius).is_empty();
        self.passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_screening_passes() {
        let mut s = HealthScreening {
            temperature_celsius: Some(36.6),
            recent_travel: true,
            ..Default::default()
        };
        assert!(s.evaluate(37.5, Utc::now()));
        assert!(s.is_screened());
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut s = HealthScreening {
            temperature_celsius: Some(37.5),
            ..Default::default()
        };
        assert!(!s.evaluate(37.5, Utc::now()));
        assert_eq!(s.failure_reasons(37.5).len(), 1);
    }

    #[test]
    fn symptoms_and_exposure_fail() {
        let s = HealthScreening {
            has_symptoms: true,
            recent_exposure: true,
            ..Default::default()
        };
        assert_eq!(s.failure_reasons(37.5).len(), 2);
    }
}
