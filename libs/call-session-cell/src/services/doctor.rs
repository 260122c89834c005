// libs/call-session-cell/src/services/doctor.rs
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument, warn};

use appointment_cell::{AppointmentApi, AppointmentPatch};
use shared_api::RestClient;
use shared_models::wire::null_as_false;

use crate::models::CallSessionError;

#[derive(Debug, Deserialize)]
struct DoctorAccountStatus {
    #[serde(default, deserialize_with = "null_as_false")]
    is_blocked: bool,
    #[serde(default)]
    block_reason: Option<String>,
}

/// Doctor-side writes on the appointment signaling channel.
pub struct DoctorCallService {
    client: Arc<RestClient>,
    appointments: Arc<dyn AppointmentApi>,
}

impl DoctorCallService {
    pub fn new(client: Arc<RestClient>, appointments: Arc<dyn AppointmentApi>) -> Self {
        Self {
            client,
            appointments,
        }
    }

    /// Offers a call to the patient. Refused while the doctor account is blocked.
    #[instrument(skip(self))]
    pub async fn start_call(&self, doctor_id: &str, appointment_id: &str) -> Result<(), CallSessionError> {
        let status: DoctorAccountStatus = self.client.get(&format!("/doctors/{}/", doctor_id)).await?;

        if status.is_blocked {
            let reason = status
                .block_reason
                .unwrap_or_else(|| "Account blocked by administrator".to_string());
            warn!("Blocked doctor {} tried to start a call: {}", doctor_id, reason);
            return Err(CallSessionError::DoctorBlocked { reason });
        }

        self.appointments
            .patch(appointment_id, &AppointmentPatch::start_call())
            .await?;
        info!("Doctor {} started call for appointment {}", doctor_id, appointment_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn end_call(&self, appointment_id: &str) -> Result<(), CallSessionError> {
        self.appointments
            .patch(appointment_id, &AppointmentPatch::end_call())
            .await?;
        info!("Doctor ended call for appointment {}", appointment_id);
        Ok(())
    }

    pub async fn request_documents(&self, appointment_id: &str) -> Result<(), CallSessionError> {
        self.appointments
            .patch(appointment_id, &AppointmentPatch::request_documents())
            .await?;
        info!("Requested documents for appointment {}", appointment_id);
        Ok(())
    }

    pub async fn request_completion(&self, appointment_id: &str) -> Result<(), CallSessionError> {
        self.appointments
            .patch(appointment_id, &AppointmentPatch::request_completion())
            .await?;
        info!("Requested consultation completion for appointment {}", appointment_id);
        Ok(())
    }
}
