// libs/call-session-cell/src/services/dispatcher.rs
use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use appointment_cell::{AppointmentApi, DocumentApi, PatientDocument};
use shared_api::SessionStore;
use shared_models::auth::UserType;

use crate::models::{CallEffect, CallIntent, CallSessionError, DispatchOutcome};
use crate::services::session::CallSession;

/// Applies user intents to the session and performs the resulting effects.
///
/// The local state changes first. A failed update is logged and reported in
/// the outcome but never rolled back or retried; the next poll reconciles.
pub struct ActionDispatcher {
    appointments: Arc<dyn AppointmentApi>,
    documents: Arc<dyn DocumentApi>,
    session: Arc<CallSession>,
    session_store: Arc<SessionStore>,
}

impl ActionDispatcher {
    pub fn new(
        appointments: Arc<dyn AppointmentApi>,
        documents: Arc<dyn DocumentApi>,
        session: Arc<CallSession>,
        session_store: Arc<SessionStore>,
    ) -> Self {
        Self {
            appointments,
            documents,
            session,
            session_store,
        }
    }

    /// The signed-in patient's documents, which is what document selection
    /// offers.
    pub async fn shareable_documents(&self) -> Result<Vec<PatientDocument>, CallSessionError> {
        let patient = self
            .session_store
            .current()
            .await
            .filter(|s| s.user_type == UserType::Patient)
            .ok_or(CallSessionError::NotSignedIn)?;

        let documents = self.documents.list_for_patient(&patient.user_id).await?;
        debug!("Patient {} can share {} documents", patient.user_id, documents.len());
        Ok(documents)
    }

    #[instrument(skip(self))]
    pub async fn dispatch(&self, intent: CallIntent) -> Result<DispatchOutcome, CallSessionError> {
        let intent_name = intent.name();

        // Selection opens over the patient's real documents; nothing is
        // changed locally if they cannot be loaded.
        let intent = match intent {
            CallIntent::GrantDocumentPermission { .. } => CallIntent::GrantDocumentPermission {
                offered: self
                    .shareable_documents()
                    .await?
                    .into_iter()
                    .map(|document| document.id)
                    .collect(),
            },
            other => other,
        };
        let (effects, phase) = self.session.apply(intent).await?;

        let mut outcome = DispatchOutcome {
            intent: intent_name.to_string(),
            phase,
            navigation: None,
            updates_sent: 0,
            failed_updates: Vec::new(),
        };

        // Effects run in order: the answer is written before navigation.
        for effect in effects {
            match effect {
                CallEffect::Patch { appointment_id, patch } => {
                    match self.appointments.patch(&appointment_id, &patch).await {
                        Ok(()) => outcome.updates_sent += 1,
                        Err(e) => {
                            error!(
                                "Failed to update appointment {} after {}: {}",
                                appointment_id, intent_name, e
                            );
                            outcome.failed_updates.push(e.to_string());
                        }
                    }
                }
                CallEffect::Navigate(navigation) => {
                    info!(?navigation, "Joining call");
                    outcome.navigation = Some(navigation);
                }
            }
        }

        Ok(outcome)
    }
}
