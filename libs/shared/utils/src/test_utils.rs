use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_api::{RestClient, SessionStore};
use shared_config::AppConfig;
use shared_models::auth::{UserSession, UserType};

pub struct TestConfig {
    pub api_base_url: String,
    pub user_type: String,
    pub user_id: String,
    pub auth_token: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            user_type: "patient".to_string(),
            user_id: "patient-1".to_string(),
            auth_token: Some("test-session-token".to_string()),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn as_doctor(mut self, doctor_id: &str) -> Self {
        self.user_type = "doctor".to_string();
        self.user_id = doctor_id.to_string();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            user_type: self.user_type.clone(),
            user_id: self.user_id.clone(),
            auth_token: self.auth_token.clone(),
            // Keep pollers fast in tests.
            call_poll_interval_ms: 20,
            call_monitor_interval_ms: 20,
            readiness_poll_interval_ms: 20,
            badge_poll_interval_ms: 20,
            appointment_refresh_interval_ms: 20,
            http_timeout_ms: 2_000,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    pub fn session_store(&self) -> Arc<SessionStore> {
        Arc::new(SessionStore::from_config(&self.to_app_config()))
    }

    pub fn rest_client(&self) -> Arc<RestClient> {
        let config = self.to_app_config();
        let session = Arc::new(SessionStore::from_config(&config));
        Arc::new(RestClient::new(&config, session).expect("test client must build"))
    }
}

pub struct TestUser;

impl TestUser {
    pub fn patient(id: &str) -> UserSession {
        UserSession {
            user_type: UserType::Patient,
            user_id: id.to_string(),
            auth_token: Some(format!("token-{}", id)),
        }
    }

    pub fn doctor(id: &str) -> UserSession {
        UserSession {
            user_type: UserType::Doctor,
            user_id: id.to_string(),
            auth_token: Some(format!("token-{}", id)),
        }
    }
}

pub struct MockPortalResponses;

impl MockPortalResponses {
    /// An appointment the doctor has just started and the patient has not answered.
    pub fn started_appointment(id: &str) -> Value {
        json!({
            "id": id,
            "patient": "patient-1",
            "appointment_started": true,
            "call_status": null,
            "patient_joined": false,
            "status": "upcoming",
            "appointment_mode": "online",
            "appointment_type": "Consultation",
            "appointment_date": "2024-12-25",
            "appointment_time": "10:00:00",
            "document_request_status": null,
            "completion_request_status": null,
            "prescription_uploaded": false,
            "doctor_info": {
                "id": "doctor-1",
                "name": "Dr. Aoife Byrne",
                "specialty": "Cardiology",
                "avatar": null
            }
        })
    }

    pub fn idle_appointment(id: &str) -> Value {
        let mut appointment = Self::started_appointment(id);
        appointment["appointment_started"] = json!(false);
        appointment
    }

    pub fn with_fields(mut appointment: Value, fields: Value) -> Value {
        if let (Some(target), Some(source)) = (appointment.as_object_mut(), fields.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        appointment
    }

    pub fn document(id: &str, appointment_id: Option<&str>, category: &str, minutes_ago: i64) -> Value {
        json!({
            "id": id,
            "document_name": format!("{}.pdf", id),
            "category": category,
            "file_size": 20480,
            "appointment": appointment_id,
            "uploaded_at": (Utc::now() - Duration::minutes(minutes_ago)).to_rfc3339()
        })
    }

    pub fn notification(id: &str, notification_type: &str, is_read: bool) -> Value {
        json!({
            "id": id,
            "notification_type": notification_type,
            "title": format!("Notification {}", id),
            "message": "Your appointment has been confirmed",
            "is_read": is_read,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_profile(id: &str, is_blocked: bool) -> Value {
        json!({
            "id": id,
            "first_name": "Aoife",
            "middle_name": null,
            "last_name": "Byrne",
            "specialty": "Cardiology",
            "email": "aoife@example.com",
            "phone": "+353 1 555 0100",
            "bio": "Consultant cardiologist",
            "avatar": null,
            "is_blocked": is_blocked,
            "block_reason": if is_blocked { json!("Licence review") } else { Value::Null },
            "time_format": "24h"
        })
    }

    pub fn paginated(items: Vec<Value>) -> Value {
        json!({
            "count": items.len(),
            "next": null,
            "previous": null,
            "results": items
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({ "error": message })
    }

    pub fn random_id() -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(config.user_type, "patient");
        assert!(config.is_configured());
    }

    #[test]
    fn test_doctor_config() {
        let config = TestConfig::default().as_doctor("doctor-9").to_app_config();
        assert_eq!(config.user_type, "doctor");
        assert_eq!(config.user_id, "doctor-9");
    }

    #[test]
    fn test_with_fields_overrides() {
        let appointment = MockPortalResponses::with_fields(
            MockPortalResponses::started_appointment("a1"),
            json!({"call_status": "answered", "patient_joined": true}),
        );

        assert_eq!(appointment["call_status"], "answered");
        assert_eq!(appointment["patient_joined"], true);
        assert_eq!(appointment["id"], "a1");
    }
}
