// libs/call-session-cell/src/services/poller.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use appointment_cell::AppointmentApi;
use shared_api::SessionStore;
use shared_models::auth::UserType;

use crate::models::{CallEvent, CallSessionError};
use crate::services::session::CallSession;

/// Polls the patient's appointments and feeds them to the [`CallSession`].
///
/// At most one fetch is in flight; ticks missed while a fetch is slow are
/// skipped rather than queued. A fetch still running at shutdown is dropped
/// and its result never reaches the session.
///
/// The poller belongs to one signed-in patient. It stops as soon as that
/// patient is no longer the session's identity, and a fetch that completes
/// after sign-out is discarded.
pub struct SessionPoller {
    appointments: Arc<dyn AppointmentApi>,
    session: Arc<CallSession>,
    session_store: Arc<SessionStore>,
    patient_id: String,
    interval: Duration,
}

impl SessionPoller {
    pub fn new(
        appointments: Arc<dyn AppointmentApi>,
        session: Arc<CallSession>,
        session_store: Arc<SessionStore>,
        patient_id: String,
        interval: Duration,
    ) -> Self {
        Self {
            appointments,
            session,
            session_store,
            patient_id,
            interval,
        }
    }

    async fn is_signed_in(&self) -> bool {
        matches!(
            self.session_store.current().await,
            Some(session) if session.user_type == UserType::Patient && session.user_id == self.patient_id
        )
    }

    #[instrument(skip(self), fields(patient_id = %self.patient_id))]
    pub async fn poll_once(&self) -> Result<Vec<CallEvent>, CallSessionError> {
        if !self.is_signed_in().await {
            return Err(CallSessionError::NotSignedIn);
        }

        let appointments = self.appointments.list_for_patient(&self.patient_id).await?;
        debug!("Checking {} appointments for incoming calls", appointments.len());
        Ok(self.session.observe(&appointments).await)
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting call poller for patient {} every {:?}",
            self.patient_id, self.interval
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let stopping = *shutdown.borrow();
            if stopping {
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            if !self.is_signed_in().await {
                info!("Patient {} signed out, stopping call poller", self.patient_id);
                break;
            }

            let fetched = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                result = self.appointments.list_for_patient(&self.patient_id) => result,
            };

            let appointments = match fetched {
                Ok(appointments) => appointments,
                Err(e) if e.is_auth() => {
                    warn!("Session rejected by backend, stopping call poller: {}", e);
                    break;
                }
                Err(e) => {
                    // Transient; the next tick retries.
                    error!("Failed to check for incoming calls: {}", e);
                    continue;
                }
            };

            if !self.is_signed_in().await {
                info!("Patient {} signed out during a poll, discarding it", self.patient_id);
                break;
            }
            self.session.observe(&appointments).await;
        }

        info!("Call poller for patient {} stopped", self.patient_id);
    }
}
