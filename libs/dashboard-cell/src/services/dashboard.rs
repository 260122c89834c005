// libs/dashboard-cell/src/services/dashboard.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use appointment_cell::{AppointmentApi, AppointmentService};
use shared_api::{RestClient, SessionStore};
use shared_models::auth::{UserSession, UserType};

use crate::models::{BadgeCounts, DashboardError, DoctorLayout, Readiness};
use crate::services::{BadgeService, DoctorLayoutService, ReadinessService};

#[derive(Default)]
struct DashboardState {
    badges: Option<BadgeCounts>,
    readiness: Option<Readiness>,
    layout: Option<DoctorLayout>,
}

/// Cached chrome data for the signed-in user.
pub struct Dashboard {
    session_store: Arc<SessionStore>,
    badges: BadgeService,
    readiness: ReadinessService,
    layout: DoctorLayoutService,
    state: RwLock<DashboardState>,
}

impl Dashboard {
    pub fn new(client: Arc<RestClient>) -> Self {
        let appointments: Arc<dyn AppointmentApi> = Arc::new(AppointmentService::new(client.clone()));
        Self::with_appointments(client, appointments)
    }

    pub fn with_appointments(client: Arc<RestClient>, appointments: Arc<dyn AppointmentApi>) -> Self {
        Self {
            session_store: client.session().clone(),
            badges: BadgeService::new(client.clone()),
            readiness: ReadinessService::new(client.clone()),
            layout: DoctorLayoutService::new(client, appointments),
            state: RwLock::new(DashboardState::default()),
        }
    }

    async fn signed_in(&self) -> Result<UserSession, DashboardError> {
        self.session_store
            .current()
            .await
            .ok_or(DashboardError::NotSignedIn)
    }

    async fn signed_in_doctor(&self) -> Result<UserSession, DashboardError> {
        let session = self.signed_in().await?;
        if session.user_type != UserType::Doctor {
            return Err(DashboardError::WrongRole(UserType::Doctor.to_string()));
        }
        Ok(session)
    }

    /// Both counters are fetched together but degrade independently: a
    /// failed counter keeps its previous value.
    pub async fn refresh_badges(&self) -> Result<BadgeCounts, DashboardError> {
        let session = self.signed_in().await?;

        let (unread, pending) = tokio::join!(
            self.badges.unread_messages(session.user_type, &session.user_id),
            self.badges.pending_payments(session.user_type, &session.user_id),
        );

        let mut state = self.state.write().await;
        let mut counts = state.badges.unwrap_or_default();

        match (unread, pending) {
            (Err(unread_error), Err(pending_error)) => {
                warn!("Failed to refresh pending payments: {}", pending_error);
                return Err(unread_error);
            }
            (unread, pending) => {
                match unread {
                    Ok(total) => counts.unread_messages = total,
                    Err(e) => warn!("Failed to refresh unread messages: {}", e),
                }
                match pending {
                    Ok(total) => counts.pending_payments = total,
                    Err(e) => warn!("Failed to refresh pending payments: {}", e),
                }
            }
        }

        state.badges = Some(counts);
        debug!(?counts, "Badges refreshed");
        Ok(counts)
    }

    pub async fn badges(&self) -> Result<BadgeCounts, DashboardError> {
        if let Some(counts) = self.state.read().await.badges {
            return Ok(counts);
        }
        self.refresh_badges().await
    }

    pub async fn refresh_readiness(&self) -> Result<Readiness, DashboardError> {
        let doctor = self.signed_in_doctor().await?;
        let readiness = self.readiness.check(&doctor.user_id).await?;

        let previous = self.state.write().await.readiness.replace(readiness);
        if previous.map(|p| p.is_ready()) != Some(readiness.is_ready()) {
            info!(
                "Doctor {} readiness: bank account {}, pricing {}",
                doctor.user_id, readiness.has_bank_account, readiness.has_pricing
            );
        }
        Ok(readiness)
    }

    pub async fn readiness(&self) -> Result<Readiness, DashboardError> {
        if let Some(readiness) = self.state.read().await.readiness {
            return Ok(readiness);
        }
        self.refresh_readiness().await
    }

    pub async fn load_layout(&self) -> Result<DoctorLayout, DashboardError> {
        let doctor = self.signed_in_doctor().await?;
        let layout = self.layout.load(&doctor.user_id).await?;
        self.state.write().await.layout = Some(layout.clone());
        Ok(layout)
    }

    pub async fn layout(&self) -> Result<DoctorLayout, DashboardError> {
        if let Some(layout) = self.state.read().await.layout.clone() {
            return Ok(layout);
        }
        self.load_layout().await
    }

    /// Replaces the appointment list of the cached layout, loading the whole
    /// layout first if nothing is cached yet.
    pub async fn refresh_appointments(&self) -> Result<usize, DashboardError> {
        let doctor = self.signed_in_doctor().await?;

        if self.state.read().await.layout.is_none() {
            return Ok(self.load_layout().await?.appointments.len());
        }

        let appointments = self.layout.appointments(&doctor.user_id).await?;
        let count = appointments.len();

        if let Some(layout) = self.state.write().await.layout.as_mut() {
            layout.appointments = appointments;
            layout.appointments_refreshed_at = Utc::now();
        }
        debug!("Refreshed {} appointments for doctor {}", count, doctor.user_id);
        Ok(count)
    }

    /// Forgets everything, e.g. on logout.
    pub async fn clear(&self) {
        *self.state.write().await = DashboardState::default();
    }
}
