// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::wire::{id_string, null_as_false, opt_id_string};

// ==============================================================================
// WIRE ENUMERATIONS
// ==============================================================================
//
// The backend stores these as free-form strings. Known values map to
// variants, anything else is kept verbatim in `Other` so one unexpected value
// does not fail a whole poll.

/// Call signaling state written by both parties. `null` on the wire is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallStatus {
    Answered,
    Declined,
    Ended,
    Other(String),
}

impl From<String> for CallStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "answered" => CallStatus::Answered,
            "declined" => CallStatus::Declined,
            "ended" => CallStatus::Ended,
            _ => CallStatus::Other(value),
        }
    }
}

impl From<CallStatus> for String {
    fn from(value: CallStatus) -> Self {
        match value {
            CallStatus::Answered => "answered".to_string(),
            CallStatus::Declined => "declined".to_string(),
            CallStatus::Ended => "ended".to_string(),
            CallStatus::Other(raw) => raw,
        }
    }
}

/// Shared by `document_request_status` and `completion_request_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestStatus {
    Requested,
    Accepted,
    Rejected,
    PermissionDenied,
    Other(String),
}

impl From<String> for RequestStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "requested" => RequestStatus::Requested,
            "accepted" => RequestStatus::Accepted,
            "rejected" => RequestStatus::Rejected,
            "permission_denied" => RequestStatus::PermissionDenied,
            _ => RequestStatus::Other(value),
        }
    }
}

impl From<RequestStatus> for String {
    fn from(value: RequestStatus) -> Self {
        match value {
            RequestStatus::Requested => "requested".to_string(),
            RequestStatus::Accepted => "accepted".to_string(),
            RequestStatus::Rejected => "rejected".to_string(),
            RequestStatus::PermissionDenied => "permission_denied".to_string(),
            RequestStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    Upcoming,
    Completed,
    Cancelled,
    Other(String),
}

impl From<String> for AppointmentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "upcoming" => AppointmentStatus::Upcoming,
            "completed" => AppointmentStatus::Completed,
            "cancelled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Other(value),
        }
    }
}

impl From<AppointmentStatus> for String {
    fn from(value: AppointmentStatus) -> Self {
        match value {
            AppointmentStatus::Upcoming => "upcoming".to_string(),
            AppointmentStatus::Completed => "completed".to_string(),
            AppointmentStatus::Cancelled => "cancelled".to_string(),
            AppointmentStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentMode {
    Online,
    InPerson,
    Other(String),
}

impl From<String> for AppointmentMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "online" => AppointmentMode::Online,
            "in-person" => AppointmentMode::InPerson,
            _ => AppointmentMode::Other(value),
        }
    }
}

impl From<AppointmentMode> for String {
    fn from(value: AppointmentMode) -> Self {
        match value {
            AppointmentMode::Online => "online".to_string(),
            AppointmentMode::InPerson => "in-person".to_string(),
            AppointmentMode::Other(raw) => raw,
        }
    }
}

// ==============================================================================
// APPOINTMENT RECORD
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorInfo {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Appointment as returned by `GET /appointments/{id}/` and the per-user
/// appointment collections. The same record doubles as the call signaling
/// channel between doctor and patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(deserialize_with = "id_string")]
    pub id: String,

    #[serde(default, deserialize_with = "opt_id_string")]
    pub patient: Option<String>,

    pub status: AppointmentStatus,

    #[serde(default)]
    pub appointment_mode: Option<AppointmentMode>,

    #[serde(default)]
    pub appointment_type: Option<String>,

    #[serde(default)]
    pub appointment_date: Option<String>,

    #[serde(default)]
    pub appointment_time: Option<String>,

    #[serde(default)]
    pub doctor_info: Option<DoctorInfo>,

    // Call signaling fields
    #[serde(default, deserialize_with = "null_as_false")]
    pub appointment_started: bool,

    #[serde(default)]
    pub call_status: Option<CallStatus>,

    #[serde(default, deserialize_with = "null_as_false")]
    pub patient_joined: bool,

    #[serde(default)]
    pub document_request_status: Option<RequestStatus>,

    #[serde(default)]
    pub completion_request_status: Option<RequestStatus>,

    #[serde(default)]
    pub shared_documents: Option<String>,

    #[serde(default, deserialize_with = "null_as_false")]
    pub prescription_uploaded: bool,
}

impl Appointment {
    /// The doctor-side half of the incoming-call predicate: the record itself
    /// is offering a call the patient has not answered or declined yet.
    pub fn is_offering_call(&self) -> bool {
        self.appointment_started
            && self.call_status != Some(CallStatus::Declined)
            && self.call_status != Some(CallStatus::Answered)
            && !self.patient_joined
            && self.status == AppointmentStatus::Upcoming
            && self.appointment_mode == Some(AppointmentMode::Online)
    }

    /// The counterparty hung up or withdrew the offer.
    pub fn call_is_over(&self) -> bool {
        self.call_status == Some(CallStatus::Ended) || !self.appointment_started
    }

    pub fn doctor_name(&self) -> String {
        self.doctor_info
            .as_ref()
            .and_then(|d| d.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Doctor".to_string())
    }

    pub fn doctor_specialty(&self) -> String {
        self.doctor_info
            .as_ref()
            .and_then(|d| d.specialty.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn doctor_avatar(&self) -> Option<String> {
        self.doctor_info.as_ref().and_then(|d| d.avatar.clone())
    }

    /// Ids the patient shared, decoded from the JSON-encoded string column.
    pub fn shared_document_ids(&self) -> Vec<String> {
        self.shared_documents
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<serde_json::Value>>(raw).ok())
            .map(|ids| {
                ids.into_iter()
                    .filter_map(|v| match v {
                        serde_json::Value::String(s) => Some(s),
                        serde_json::Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ==============================================================================
// PARTIAL UPDATES
// ==============================================================================

/// Body of `PATCH /appointments/{id}/`.
///
/// Outer `None` omits the field, `Some(None)` writes an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_started: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_call_started: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_status: Option<Option<CallStatus>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_joined: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_request_status: Option<Option<RequestStatus>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_documents: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_request_status: Option<Option<RequestStatus>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription_uploaded: Option<bool>,
}

impl AppointmentPatch {
    // Patient side

    pub fn answer_call() -> Self {
        Self {
            patient_joined: Some(true),
            call_status: Some(Some(CallStatus::Answered)),
            ..Self::default()
        }
    }

    pub fn decline_call() -> Self {
        Self {
            call_status: Some(Some(CallStatus::Declined)),
            appointment_started: Some(false),
            ..Self::default()
        }
    }

    /// Also used by the doctor to hang up.
    pub fn end_call() -> Self {
        Self {
            call_status: Some(Some(CallStatus::Ended)),
            appointment_started: Some(false),
            ..Self::default()
        }
    }

    pub fn deny_documents() -> Self {
        Self {
            document_request_status: Some(Some(RequestStatus::PermissionDenied)),
            ..Self::default()
        }
    }

    pub fn share_documents(document_ids: &[String]) -> Result<Self, serde_json::Error> {
        Ok(Self {
            document_request_status: Some(Some(RequestStatus::Accepted)),
            shared_documents: Some(Some(serde_json::to_string(document_ids)?)),
            ..Self::default()
        })
    }

    pub fn reject_completion() -> Self {
        Self {
            completion_request_status: Some(Some(RequestStatus::Rejected)),
            ..Self::default()
        }
    }

    pub fn accept_completion() -> Self {
        Self {
            completion_request_status: Some(Some(RequestStatus::Accepted)),
            status: Some(AppointmentStatus::Completed),
            appointment_started: Some(false),
            call_status: Some(None),
            patient_joined: Some(false),
            ..Self::default()
        }
    }

    // Doctor side

    /// Offers a call and clears every leftover from a previous call.
    pub fn start_call() -> Self {
        Self {
            appointment_started: Some(true),
            call_status: Some(None),
            patient_joined: Some(false),
            document_request_status: Some(None),
            shared_documents: Some(None),
            completion_request_status: Some(None),
            prescription_uploaded: Some(false),
            ..Self::default()
        }
    }

    pub fn request_documents() -> Self {
        Self {
            document_request_status: Some(Some(RequestStatus::Requested)),
            ..Self::default()
        }
    }

    pub fn request_completion() -> Self {
        Self {
            completion_request_status: Some(Some(RequestStatus::Requested)),
            ..Self::default()
        }
    }

    /// Written by the doctor once the patient agreed to finish.
    pub fn finalize_consultation() -> Self {
        Self {
            status: Some(AppointmentStatus::Completed),
            appointment_started: Some(false),
            video_call_started: Some(false),
            call_status: Some(None),
            patient_joined: Some(false),
            document_request_status: Some(None),
            shared_documents: Some(None),
            completion_request_status: Some(None),
            ..Self::default()
        }
    }
}

// ==============================================================================
// PATIENT DOCUMENTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDocument {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub appointment: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl PatientDocument {
    pub fn is_prescription(&self) -> bool {
        self.category.as_deref() == Some("Prescription")
    }
}
