// libs/call-session-cell/src/context.rs
use std::sync::Arc;

use appointment_cell::{AppointmentApi, AppointmentService, DocumentApi, DocumentService};
use shared_api::{RestClient, SessionStore};
use shared_config::AppConfig;

use crate::services::{ActionDispatcher, CallSession, DoctorCallService, MonitorRegistry};

/// Everything the call routes and background pollers share.
#[derive(Clone)]
pub struct CallContext {
    pub session_store: Arc<SessionStore>,
    pub appointments: Arc<dyn AppointmentApi>,
    pub call_session: Arc<CallSession>,
    pub dispatcher: Arc<ActionDispatcher>,
    pub doctor_calls: Arc<DoctorCallService>,
    pub monitors: Arc<MonitorRegistry>,
}

impl CallContext {
    pub fn new(config: &AppConfig, client: Arc<RestClient>) -> Self {
        let appointments: Arc<dyn AppointmentApi> = Arc::new(AppointmentService::new(client.clone()));
        let documents: Arc<dyn DocumentApi> = Arc::new(DocumentService::new(client.clone()));

        Self::with_services(
            client.session().clone(),
            client,
            appointments,
            documents,
            config,
        )
    }

    pub fn with_services(
        session_store: Arc<SessionStore>,
        client: Arc<RestClient>,
        appointments: Arc<dyn AppointmentApi>,
        documents: Arc<dyn DocumentApi>,
        config: &AppConfig,
    ) -> Self {
        let call_session = Arc::new(CallSession::new());

        Self {
            dispatcher: Arc::new(ActionDispatcher::new(
                appointments.clone(),
                documents.clone(),
                call_session.clone(),
                session_store.clone(),
            )),
            doctor_calls: Arc::new(DoctorCallService::new(client, appointments.clone())),
            monitors: Arc::new(MonitorRegistry::new(
                appointments.clone(),
                documents,
                config.call_monitor_interval(),
            )),
            session_store,
            appointments,
            call_session,
        }
    }
}
