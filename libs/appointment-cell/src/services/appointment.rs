// libs/appointment-cell/src/services/appointment.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use shared_api::{ApiError, RestClient};

use crate::models::{Appointment, AppointmentPatch};

/// Appointment transport. The call pollers and dispatchers only see this
/// trait, so they can run against the REST backend or an in-memory fake.
#[async_trait]
pub trait AppointmentApi: Send + Sync {
    async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<Appointment>, ApiError>;

    async fn list_for_doctor(&self, doctor_id: &str) -> Result<Vec<Appointment>, ApiError>;

    async fn get(&self, appointment_id: &str) -> Result<Appointment, ApiError>;

    /// Last write wins on the backend; there is no version check.
    async fn patch(&self, appointment_id: &str, patch: &AppointmentPatch) -> Result<(), ApiError>;
}

pub struct AppointmentService {
    client: Arc<RestClient>,
}

impl AppointmentService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AppointmentApi for AppointmentService {
    async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<Appointment>, ApiError> {
        let path = format!("/patients/{}/appointments", patient_id);
        let appointments: Vec<Appointment> = self.client.get_collection(&path).await?;
        debug!("Fetched {} appointments for patient {}", appointments.len(), patient_id);
        Ok(appointments)
    }

    async fn list_for_doctor(&self, doctor_id: &str) -> Result<Vec<Appointment>, ApiError> {
        let path = format!("/doctors/{}/appointments", doctor_id);
        let appointments: Vec<Appointment> = self.client.get_collection(&path).await?;
        debug!("Fetched {} appointments for doctor {}", appointments.len(), doctor_id);
        Ok(appointments)
    }

    async fn get(&self, appointment_id: &str) -> Result<Appointment, ApiError> {
        self.client
            .get(&format!("/appointments/{}/", appointment_id))
            .await
    }

    #[instrument(skip(self, patch))]
    async fn patch(&self, appointment_id: &str, patch: &AppointmentPatch) -> Result<(), ApiError> {
        self.client
            .patch(&format!("/appointments/{}/", appointment_id), patch)
            .await?;
        info!("Appointment {} updated", appointment_id);
        Ok(())
    }
}
