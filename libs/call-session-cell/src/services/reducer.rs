// libs/call-session-cell/src/services/reducer.rs
use appointment_cell::{Appointment, AppointmentPatch, RequestStatus};

use crate::models::{
    ActiveCall, CallEffect, CallEvent, CallIntent, CallParty, CallPhase, CallSessionError,
    DocumentStep, IncomingCall, Navigation,
};
use crate::services::handled::HandledSet;

type Transition = Result<(CallPhase, Vec<CallEffect>), (CallPhase, CallSessionError)>;

/// Patient call state. Pure: every method is a synchronous transition and
/// all I/O is returned as [`CallEffect`]s for the caller to execute.
#[derive(Debug, Clone, Default)]
pub struct CallState {
    pub phase: CallPhase,
    pub handled: HandledSet,
}

impl CallState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one poll of the patient's appointments into the state.
    pub fn observe(&mut self, appointments: &[Appointment]) -> Vec<CallEvent> {
        let mut events = Vec::new();

        for appointment in appointments.iter().filter(|a| !a.appointment_started) {
            if self.handled.release(&appointment.id) {
                events.push(CallEvent::HandledReleased {
                    appointment_id: appointment.id.clone(),
                });
            }
        }

        self.reconcile_active_call(appointments, &mut events);

        let candidates: Vec<&Appointment> = if self.phase.in_call() {
            Vec::new()
        } else {
            appointments
                .iter()
                .filter(|a| a.is_offering_call() && !self.handled.contains(&a.id))
                .collect()
        };

        // The prompt only stays up while its appointment still qualifies.
        if let Some(ringing) = self.phase.incoming_call() {
            if !candidates.iter().any(|a| a.id == ringing.appointment_id) {
                events.push(CallEvent::IncomingCallWithdrawn {
                    appointment_id: ringing.appointment_id.clone(),
                });
                self.phase = CallPhase::Idle;
            }
        }

        if self.phase.can_ring() {
            if let Some(appointment) = candidates.first() {
                let call = IncomingCall::from_appointment(appointment);
                events.push(CallEvent::IncomingCall {
                    appointment_id: call.appointment_id.clone(),
                    doctor_name: call.doctor_name.clone(),
                    doctor_specialty: call.doctor_specialty.clone(),
                });
                self.phase = CallPhase::Incoming { call };
            }
        }

        events
    }

    fn reconcile_active_call(&mut self, appointments: &[Appointment], events: &mut Vec<CallEvent>) {
        let Some(call) = self.phase.active_call_mut() else {
            return;
        };
        let Some(appointment) = appointments.iter().find(|a| a.id == call.appointment_id) else {
            return;
        };

        if appointment.call_is_over() {
            let appointment_id = call.appointment_id.clone();
            events.push(CallEvent::CallEndedByDoctor {
                appointment_id: appointment_id.clone(),
            });
            self.phase = CallPhase::CallEnded {
                appointment_id,
                ended_by: CallParty::Doctor,
            };
            return;
        }

        if appointment.document_request_status == Some(RequestStatus::Requested) {
            if call.documents.is_none() && !call.document_request_answered {
                call.documents = Some(DocumentStep::PermissionRequest);
                events.push(CallEvent::DocumentsRequested {
                    appointment_id: call.appointment_id.clone(),
                });
            }
        } else {
            call.document_request_answered = false;
        }

        if appointment.completion_request_status == Some(RequestStatus::Requested) {
            if !call.completion_requested && !call.completion_request_answered {
                call.completion_requested = true;
                events.push(CallEvent::CompletionRequested {
                    appointment_id: call.appointment_id.clone(),
                });
            }
        } else {
            call.completion_request_answered = false;
        }

        if appointment.prescription_uploaded && !call.prescription_uploaded {
            call.prescription_uploaded = true;
            call.prescription_notice = true;
            events.push(CallEvent::PrescriptionUploaded {
                appointment_id: call.appointment_id.clone(),
            });
        }
    }

    /// Applies a user intent. On error the state is left untouched.
    pub fn apply(&mut self, intent: CallIntent) -> Result<Vec<CallEffect>, CallSessionError> {
        let current = std::mem::take(&mut self.phase);
        match self.transition(intent, current) {
            Ok((next, effects)) => {
                self.phase = next;
                Ok(effects)
            }
            Err((restored, error)) => {
                self.phase = restored;
                Err(error)
            }
        }
    }

    fn transition(&mut self, intent: CallIntent, phase: CallPhase) -> Transition {
        let intent_name = intent.name();
        let phase_name = phase.name();
        let invalid = || CallSessionError::InvalidTransition {
            intent: intent_name.to_string(),
            phase: phase_name.to_string(),
        };

        match (intent, phase) {
            // Incoming call prompt
            (CallIntent::RequestAnswer, CallPhase::Incoming { call }) => {
                Ok((CallPhase::AnswerConfirm { call }, Vec::new()))
            }
            (CallIntent::CancelAnswer, CallPhase::AnswerConfirm { call }) => {
                Ok((CallPhase::Incoming { call }, Vec::new()))
            }
            (CallIntent::RequestDecline, CallPhase::Incoming { call })
            | (CallIntent::RequestDecline, CallPhase::AnswerConfirm { call }) => {
                Ok((CallPhase::DeclineConfirm { call }, Vec::new()))
            }
            (CallIntent::CancelDecline, CallPhase::DeclineConfirm { call }) => {
                Ok((CallPhase::Incoming { call }, Vec::new()))
            }
            (CallIntent::Accept, CallPhase::Incoming { call })
            | (CallIntent::Accept, CallPhase::AnswerConfirm { call }) => {
                self.handled.insert(&call.appointment_id);
                let appointment_id = call.appointment_id.clone();
                Ok((
                    CallPhase::Active { call: ActiveCall::from(call) },
                    vec![
                        CallEffect::Patch {
                            appointment_id: appointment_id.clone(),
                            patch: AppointmentPatch::answer_call(),
                        },
                        CallEffect::Navigate(Navigation::JoinCall { appointment_id }),
                    ],
                ))
            }
            (CallIntent::Decline, CallPhase::Incoming { call })
            | (CallIntent::Decline, CallPhase::DeclineConfirm { call }) => {
                self.handled.insert(&call.appointment_id);
                Ok((
                    CallPhase::Idle,
                    vec![CallEffect::Patch {
                        appointment_id: call.appointment_id,
                        patch: AppointmentPatch::decline_call(),
                    }],
                ))
            }

            // Hanging up
            (CallIntent::RequestEnd, CallPhase::Active { call }) => {
                Ok((CallPhase::EndCallConfirm { call }, Vec::new()))
            }
            (CallIntent::CancelEnd, CallPhase::EndCallConfirm { call }) => {
                Ok((CallPhase::Active { call }, Vec::new()))
            }
            (CallIntent::End, CallPhase::Active { call })
            | (CallIntent::End, CallPhase::EndCallConfirm { call }) => {
                self.handled.insert(&call.appointment_id);
                Ok((
                    CallPhase::CallEnded {
                        appointment_id: call.appointment_id.clone(),
                        ended_by: CallParty::Patient,
                    },
                    vec![CallEffect::Patch {
                        appointment_id: call.appointment_id,
                        patch: AppointmentPatch::end_call(),
                    }],
                ))
            }

            // Document sharing
            (CallIntent::GrantDocumentPermission { offered }, CallPhase::Active { mut call }) => {
                if call.documents != Some(DocumentStep::PermissionRequest) {
                    return Err((CallPhase::Active { call }, invalid()));
                }
                call.documents = Some(DocumentStep::Selecting {
                    offered,
                    selected: Vec::new(),
                });
                Ok((CallPhase::Active { call }, Vec::new()))
            }
            (CallIntent::DenyDocumentPermission, CallPhase::Active { mut call }) => {
                if call.documents != Some(DocumentStep::PermissionRequest) {
                    return Err((CallPhase::Active { call }, invalid()));
                }
                call.documents = None;
                call.document_request_answered = true;
                let effect = CallEffect::Patch {
                    appointment_id: call.appointment_id.clone(),
                    patch: AppointmentPatch::deny_documents(),
                };
                Ok((CallPhase::Active { call }, vec![effect]))
            }
            (CallIntent::ToggleDocument { document_id }, CallPhase::Active { mut call }) => {
                // Only documents the patient actually owns can be picked.
                let is_offered = matches!(
                    &call.documents,
                    Some(DocumentStep::Selecting { offered, .. }) if offered.contains(&document_id)
                );
                if !is_offered {
                    return Err((CallPhase::Active { call }, invalid()));
                }
                if let Some(DocumentStep::Selecting { selected, .. }) = call.documents.as_mut() {
                    match selected.iter().position(|id| *id == document_id) {
                        Some(index) => {
                            selected.remove(index);
                        }
                        None => selected.push(document_id),
                    }
                }
                Ok((CallPhase::Active { call }, Vec::new()))
            }
            (CallIntent::ShareSelectedDocuments, CallPhase::Active { mut call }) => {
                let selected = match &call.documents {
                    Some(DocumentStep::Selecting { selected, .. }) => Some(selected.clone()),
                    _ => None,
                };
                let Some(selected) = selected else {
                    return Err((CallPhase::Active { call }, invalid()));
                };
                let patch = match AppointmentPatch::share_documents(&selected) {
                    Ok(patch) => patch,
                    Err(e) => return Err((CallPhase::Active { call }, e.into())),
                };
                call.documents = Some(DocumentStep::Shared { count: selected.len() });
                call.document_request_answered = true;
                let effect = CallEffect::Patch {
                    appointment_id: call.appointment_id.clone(),
                    patch,
                };
                Ok((CallPhase::Active { call }, vec![effect]))
            }
            (CallIntent::DeclineDocumentSelection, CallPhase::Active { mut call }) => {
                if !matches!(call.documents, Some(DocumentStep::Selecting { .. })) {
                    return Err((CallPhase::Active { call }, invalid()));
                }
                // Nothing partial is ever sent; the selection is discarded.
                call.documents = Some(DocumentStep::Declined);
                call.document_request_answered = true;
                let effect = CallEffect::Patch {
                    appointment_id: call.appointment_id.clone(),
                    patch: AppointmentPatch::deny_documents(),
                };
                Ok((CallPhase::Active { call }, vec![effect]))
            }

            // Consultation completion
            (CallIntent::AcceptCompletion, CallPhase::Active { call }) => {
                if !call.completion_requested {
                    return Err((CallPhase::Active { call }, invalid()));
                }
                self.handled.insert(&call.appointment_id);
                Ok((
                    CallPhase::ConsultationFinished {
                        appointment_id: call.appointment_id.clone(),
                    },
                    vec![CallEffect::Patch {
                        appointment_id: call.appointment_id,
                        patch: AppointmentPatch::accept_completion(),
                    }],
                ))
            }
            (CallIntent::RejectCompletion, CallPhase::Active { mut call }) => {
                if !call.completion_requested {
                    return Err((CallPhase::Active { call }, invalid()));
                }
                call.completion_requested = false;
                call.completion_request_answered = true;
                let effect = CallEffect::Patch {
                    appointment_id: call.appointment_id.clone(),
                    patch: AppointmentPatch::reject_completion(),
                };
                Ok((CallPhase::Active { call }, vec![effect]))
            }

            (CallIntent::DismissPrescriptionNotice, CallPhase::Active { mut call }) => {
                call.prescription_notice = false;
                Ok((CallPhase::Active { call }, Vec::new()))
            }

            // Acknowledgements
            (CallIntent::Dismiss, CallPhase::CallEnded { .. })
            | (CallIntent::Dismiss, CallPhase::ConsultationFinished { .. }) => {
                Ok((CallPhase::Idle, Vec::new()))
            }
            (CallIntent::Dismiss, CallPhase::Active { mut call }) => {
                if !matches!(
                    call.documents,
                    Some(DocumentStep::Shared { .. }) | Some(DocumentStep::Declined)
                ) {
                    return Err((CallPhase::Active { call }, invalid()));
                }
                call.documents = None;
                Ok((CallPhase::Active { call }, Vec::new()))
            }

            (_, phase) => Err((phase, invalid())),
        }
    }
}
