// libs/call-session-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::{
    Appointment, AppointmentMode, AppointmentPatch, PatientDocument, RequestStatus,
};
use shared_api::ApiError;

// ==============================================================================
// PATIENT-SIDE CALL STATE
// ==============================================================================

/// What the patient sees while a doctor is ringing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomingCall {
    pub appointment_id: String,
    pub doctor_name: String,
    pub doctor_specialty: String,
    pub doctor_avatar: Option<String>,
    pub appointment_type: Option<String>,
    pub appointment_mode: Option<AppointmentMode>,
}

impl IncomingCall {
    pub fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id.clone(),
            doctor_name: appointment.doctor_name(),
            doctor_specialty: appointment.doctor_specialty(),
            doctor_avatar: appointment.doctor_avatar(),
            appointment_type: appointment.appointment_type.clone(),
            appointment_mode: appointment.appointment_mode.clone(),
        }
    }
}

/// Progress of a doctor's request to see the patient's documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DocumentStep {
    PermissionRequest,
    /// `offered` holds the ids of the patient's own documents; only those
    /// can be selected.
    Selecting {
        offered: Vec<String>,
        selected: Vec<String>,
    },
    Shared { count: usize },
    Declined,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveCall {
    pub appointment_id: String,
    pub doctor_name: String,
    pub doctor_specialty: String,
    pub documents: Option<DocumentStep>,
    pub completion_requested: bool,
    pub prescription_uploaded: bool,
    pub prescription_notice: bool,

    // Set once the patient answered the current server-side request; cleared
    // when the server leaves "requested", so a repeated request opens again.
    #[serde(skip)]
    pub document_request_answered: bool,
    #[serde(skip)]
    pub completion_request_answered: bool,
}

impl From<IncomingCall> for ActiveCall {
    fn from(call: IncomingCall) -> Self {
        Self {
            appointment_id: call.appointment_id,
            doctor_name: call.doctor_name,
            doctor_specialty: call.doctor_specialty,
            documents: None,
            completion_requested: false,
            prescription_uploaded: false,
            prescription_notice: false,
            document_request_answered: false,
            completion_request_answered: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallParty {
    Patient,
    Doctor,
}

/// Patient call state machine.
///
/// ```text
/// Idle -> Incoming <-> AnswerConfirm -> Active <-> EndCallConfirm
///            |                            |
///            +-> DeclineConfirm -> Idle   +-> CallEnded | ConsultationFinished -> Idle
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CallPhase {
    #[default]
    Idle,
    Incoming {
        call: IncomingCall,
    },
    AnswerConfirm {
        call: IncomingCall,
    },
    DeclineConfirm {
        call: IncomingCall,
    },
    Active {
        call: ActiveCall,
    },
    EndCallConfirm {
        call: ActiveCall,
    },
    CallEnded {
        appointment_id: String,
        ended_by: CallParty,
    },
    ConsultationFinished {
        appointment_id: String,
    },
}

impl CallPhase {
    pub fn name(&self) -> &'static str {
        match self {
            CallPhase::Idle => "idle",
            CallPhase::Incoming { .. } => "incoming",
            CallPhase::AnswerConfirm { .. } => "answer_confirm",
            CallPhase::DeclineConfirm { .. } => "decline_confirm",
            CallPhase::Active { .. } => "active",
            CallPhase::EndCallConfirm { .. } => "end_call_confirm",
            CallPhase::CallEnded { .. } => "call_ended",
            CallPhase::ConsultationFinished { .. } => "consultation_finished",
        }
    }

    pub fn in_call(&self) -> bool {
        matches!(self, CallPhase::Active { .. } | CallPhase::EndCallConfirm { .. })
    }

    /// A new incoming call may replace this phase.
    pub fn can_ring(&self) -> bool {
        matches!(
            self,
            CallPhase::Idle | CallPhase::CallEnded { .. } | CallPhase::ConsultationFinished { .. }
        )
    }

    pub fn incoming_call(&self) -> Option<&IncomingCall> {
        match self {
            CallPhase::Incoming { call }
            | CallPhase::AnswerConfirm { call }
            | CallPhase::DeclineConfirm { call } => Some(call),
            _ => None,
        }
    }

    pub fn active_call(&self) -> Option<&ActiveCall> {
        match self {
            CallPhase::Active { call } | CallPhase::EndCallConfirm { call } => Some(call),
            _ => None,
        }
    }

    pub(crate) fn active_call_mut(&mut self) -> Option<&mut ActiveCall> {
        match self {
            CallPhase::Active { call } | CallPhase::EndCallConfirm { call } => Some(call),
            _ => None,
        }
    }
}

// ==============================================================================
// INTENTS, EFFECTS AND EVENTS
// ==============================================================================

/// A user action on the patient side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum CallIntent {
    RequestAnswer,
    CancelAnswer,
    Accept,
    RequestDecline,
    CancelDecline,
    Decline,
    RequestEnd,
    CancelEnd,
    End,
    /// Filled in by the dispatcher from the patient's documents. A client
    /// cannot supply the offered ids.
    GrantDocumentPermission {
        #[serde(skip)]
        offered: Vec<String>,
    },
    DenyDocumentPermission,
    ToggleDocument { document_id: String },
    ShareSelectedDocuments,
    DeclineDocumentSelection,
    AcceptCompletion,
    RejectCompletion,
    DismissPrescriptionNotice,
    Dismiss,
}

impl CallIntent {
    pub fn name(&self) -> &'static str {
        match self {
            CallIntent::RequestAnswer => "request_answer",
            CallIntent::CancelAnswer => "cancel_answer",
            CallIntent::Accept => "accept",
            CallIntent::RequestDecline => "request_decline",
            CallIntent::CancelDecline => "cancel_decline",
            CallIntent::Decline => "decline",
            CallIntent::RequestEnd => "request_end",
            CallIntent::CancelEnd => "cancel_end",
            CallIntent::End => "end",
            CallIntent::GrantDocumentPermission { .. } => "grant_document_permission",
            CallIntent::DenyDocumentPermission => "deny_document_permission",
            CallIntent::ToggleDocument { .. } => "toggle_document",
            CallIntent::ShareSelectedDocuments => "share_selected_documents",
            CallIntent::DeclineDocumentSelection => "decline_document_selection",
            CallIntent::AcceptCompletion => "accept_completion",
            CallIntent::RejectCompletion => "reject_completion",
            CallIntent::DismissPrescriptionNotice => "dismiss_prescription_notice",
            CallIntent::Dismiss => "dismiss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "navigate", rename_all = "snake_case")]
pub enum Navigation {
    JoinCall { appointment_id: String },
}

/// Work the reducer asks the transport to perform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEffect {
    Patch {
        appointment_id: String,
        patch: AppointmentPatch,
    },
    Navigate(Navigation),
}

/// Something the patient should be told about after a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CallEvent {
    IncomingCall {
        appointment_id: String,
        doctor_name: String,
        doctor_specialty: String,
    },
    IncomingCallWithdrawn {
        appointment_id: String,
    },
    DocumentsRequested {
        appointment_id: String,
    },
    CompletionRequested {
        appointment_id: String,
    },
    PrescriptionUploaded {
        appointment_id: String,
    },
    CallEndedByDoctor {
        appointment_id: String,
    },
    HandledReleased {
        appointment_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSnapshot {
    pub version: u64,
    pub phase: CallPhase,
    pub handled: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub intent: String,
    pub phase: CallPhase,
    pub navigation: Option<Navigation>,
    pub updates_sent: usize,
    pub failed_updates: Vec<String>,
}

// ==============================================================================
// DOCTOR-SIDE CALL MONITORING
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallClosure {
    Declined,
    Ended,
    Finished,
}

/// The doctor's view of one call in progress.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorCallView {
    pub appointment_id: String,
    pub patient_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub patient_answered: bool,
    pub closed: Option<CallClosure>,
    pub permission_denied: bool,
    pub received_documents: Vec<PatientDocument>,
    pub completion_response: Option<RequestStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DoctorCallEvent {
    PatientAnswered,
    CallDeclined,
    CallEnded,
    DocumentPermissionDenied,
    DocumentsReceived { count: usize },
    CompletionAccepted,
    CompletionRejected,
    ConsultationFinished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorCallUpdate {
    pub appointment_id: String,
    #[serde(flatten)]
    pub event: DoctorCallEvent,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum CallSessionError {
    #[error("Cannot {intent} while the call is {phase}")]
    InvalidTransition { intent: String, phase: String },

    #[error("Doctor account is blocked: {reason}")]
    DoctorBlocked { reason: String },

    #[error("No call monitor for appointment {0}")]
    MonitorNotFound(String),

    #[error("Signed-in user is not a {0}")]
    WrongRole(String),

    #[error("No signed-in user")]
    NotSignedIn,

    #[error("Portal API error: {0}")]
    Api(#[from] ApiError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
