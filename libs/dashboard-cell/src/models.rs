// libs/dashboard-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::Appointment;
use shared_api::ApiError;
use shared_models::wire::{id_string, lenient_f64, null_as_false};

// ==============================================================================
// BADGES
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub unread_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BadgeCounts {
    pub unread_messages: u64,
    pub pending_payments: usize,
}

// ==============================================================================
// DOCTOR READINESS
// ==============================================================================

/// Pricing row; the backend has used two naming schemes for the fees.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DoctorPricing {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub online_consultation_fee: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub online_fee: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub in_person_consultation_fee: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub in_person_fee: Option<f64>,
}

fn first_positive(primary: Option<f64>, fallback: Option<f64>) -> f64 {
    primary
        .filter(|fee| *fee > 0.0)
        .or(fallback)
        .unwrap_or(0.0)
}

impl DoctorPricing {
    pub fn online(&self) -> f64 {
        first_positive(self.online_consultation_fee, self.online_fee)
    }

    pub fn in_person(&self) -> f64 {
        first_positive(self.in_person_consultation_fee, self.in_person_fee)
    }

    pub fn is_complete(&self) -> bool {
        self.online() > 0.0 && self.in_person() > 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Readiness {
    pub has_bank_account: bool,
    pub has_pricing: bool,
    pub online_fee: f64,
    pub in_person_fee: f64,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.has_bank_account && self.has_pricing
    }
}

// ==============================================================================
// DOCTOR LAYOUT
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_blocked: bool,
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub time_format: Option<String>,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub month_format: Option<String>,
}

impl DoctorProfile {
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkingHoursRow {
    pub day_of_week: String,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_available: bool,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BreakTimeRow {
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySchedule {
    pub day: String,
    pub enabled: bool,
    pub start: String,
    pub end: String,
    pub breaks: Vec<TimeRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPatient {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub patient_info: FeedbackPatient,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub doctor_reply: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorLayout {
    pub profile: DoctorProfile,
    pub weekly_schedule: Vec<DaySchedule>,
    pub appointments: Vec<Appointment>,
    pub feedback: Vec<Feedback>,
    pub loaded_at: DateTime<Utc>,
    pub appointments_refreshed_at: DateTime<Utc>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("No signed-in user")]
    NotSignedIn,

    #[error("Signed-in user is not a {0}")]
    WrongRole(String),

    #[error("Portal API error: {0}")]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pricing_accepts_both_field_names() {
        let legacy: DoctorPricing =
            serde_json::from_value(json!({"online_fee": "40.00", "in_person_fee": 60})).unwrap();
        assert_eq!(legacy.online(), 40.0);
        assert_eq!(legacy.in_person(), 60.0);
        assert!(legacy.is_complete());

        let current: DoctorPricing = serde_json::from_value(json!({
            "online_consultation_fee": 50,
            "in_person_consultation_fee": 0,
            "in_person_fee": null
        }))
        .unwrap();
        assert_eq!(current.online(), 50.0);
        assert!(!current.is_complete());
    }

    #[test]
    fn test_profile_full_name_skips_missing_parts() {
        let profile: DoctorProfile = serde_json::from_value(json!({
            "id": 7,
            "first_name": "Aoife",
            "middle_name": "",
            "last_name": "Byrne"
        }))
        .unwrap();

        assert_eq!(profile.id, "7");
        assert_eq!(profile.full_name(), "Aoife Byrne");
    }

    #[test]
    fn test_readiness_requires_both() {
        let readiness = Readiness {
            has_bank_account: true,
            has_pricing: false,
            ..Readiness::default()
        };
        assert!(!readiness.is_ready());
    }
}
