// libs/call-session-cell/src/services/monitor.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use appointment_cell::{
    Appointment, AppointmentApi, AppointmentPatch, CallStatus, DocumentApi, PatientDocument,
    RequestStatus,
};

use crate::models::{
    CallClosure, CallSessionError, DoctorCallEvent, DoctorCallUpdate, DoctorCallView,
};

const UPDATE_CHANNEL_CAPACITY: usize = 64;

// ==============================================================================
// TRACKER
// ==============================================================================

/// Pure doctor-side view of one call; fed one appointment record per tick.
#[derive(Debug, Clone)]
pub struct DoctorCallTracker {
    view: DoctorCallView,
    permission_denied_seen: bool,
    completion_response_seen: bool,
}

impl DoctorCallTracker {
    pub fn new(appointment_id: &str, patient_id: Option<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            view: DoctorCallView {
                appointment_id: appointment_id.to_string(),
                patient_id,
                started_at,
                patient_answered: false,
                closed: None,
                permission_denied: false,
                received_documents: Vec::new(),
                completion_response: None,
            },
            permission_denied_seen: false,
            completion_response_seen: false,
        }
    }

    pub fn view(&self) -> &DoctorCallView {
        &self.view
    }

    pub fn is_closed(&self) -> bool {
        self.view.closed.is_some()
    }

    pub fn observe(&mut self, appointment: &Appointment) -> Vec<DoctorCallEvent> {
        let mut events = Vec::new();
        if self.is_closed() {
            return events;
        }

        if self.view.patient_id.is_none() {
            self.view.patient_id = appointment.patient.clone();
        }

        if appointment.patient_joined && !self.view.patient_answered {
            self.view.patient_answered = true;
            events.push(DoctorCallEvent::PatientAnswered);
        }

        match appointment.call_status {
            Some(CallStatus::Declined) => {
                self.view.closed = Some(CallClosure::Declined);
                self.view.received_documents.clear();
                events.push(DoctorCallEvent::CallDeclined);
                return events;
            }
            Some(CallStatus::Ended) => {
                self.view.closed = Some(CallClosure::Ended);
                self.view.received_documents.clear();
                events.push(DoctorCallEvent::CallEnded);
                return events;
            }
            _ => {}
        }

        match appointment.document_request_status {
            Some(RequestStatus::PermissionDenied) if !self.permission_denied_seen => {
                self.permission_denied_seen = true;
                self.view.permission_denied = true;
                events.push(DoctorCallEvent::DocumentPermissionDenied);
            }
            Some(RequestStatus::Requested) => {
                // A new request; the next denial is reported again.
                self.permission_denied_seen = false;
                self.view.permission_denied = false;
            }
            _ => {}
        }

        match &appointment.completion_request_status {
            Some(RequestStatus::Accepted) if !self.completion_response_seen => {
                self.completion_response_seen = true;
                self.view.completion_response = Some(RequestStatus::Accepted);
                events.push(DoctorCallEvent::CompletionAccepted);
            }
            Some(RequestStatus::Rejected) if !self.completion_response_seen => {
                self.completion_response_seen = true;
                self.view.completion_response = Some(RequestStatus::Rejected);
                events.push(DoctorCallEvent::CompletionRejected);
            }
            Some(RequestStatus::Requested) => {
                self.completion_response_seen = false;
                self.view.completion_response = None;
            }
            _ => {}
        }

        events
    }

    pub fn wants_documents(&self, appointment: &Appointment) -> bool {
        !self.is_closed() && appointment.document_request_status == Some(RequestStatus::Accepted)
    }

    /// Keeps documents the patient listed for this appointment, plus ones
    /// linked to it and uploaded since the call started. Prescriptions are
    /// the doctor's own uploads and never count.
    pub fn absorb_documents(
        &mut self,
        appointment: &Appointment,
        documents: Vec<PatientDocument>,
    ) -> Option<DoctorCallEvent> {
        let listed = appointment.shared_document_ids();
        let started_at = self.view.started_at;

        let received: Vec<PatientDocument> = documents
            .into_iter()
            .filter(|d| !d.is_prescription())
            .filter(|d| {
                listed.contains(&d.id)
                    || (d.appointment.as_deref() == Some(appointment.id.as_str())
                        && d.uploaded_at.map(|at| at >= started_at).unwrap_or(false))
            })
            .collect();

        let before: Vec<&str> = self.view.received_documents.iter().map(|d| d.id.as_str()).collect();
        let changed = received.len() != before.len()
            || received.iter().any(|d| !before.contains(&d.id.as_str()));

        if !changed {
            return None;
        }

        let count = received.len();
        self.view.received_documents = received;
        Some(DoctorCallEvent::DocumentsReceived { count })
    }

    pub fn mark_finished(&mut self) -> DoctorCallEvent {
        self.view.closed = Some(CallClosure::Finished);
        DoctorCallEvent::ConsultationFinished
    }
}

// ==============================================================================
// MONITOR TASK
// ==============================================================================

/// Polls one appointment on behalf of the doctor while a call is running.
pub struct DoctorCallMonitor {
    appointment_id: String,
    appointments: Arc<dyn AppointmentApi>,
    documents: Arc<dyn DocumentApi>,
    tracker: Arc<Mutex<DoctorCallTracker>>,
    updates: broadcast::Sender<DoctorCallUpdate>,
    interval: Duration,
}

impl DoctorCallMonitor {
    pub fn new(
        appointment_id: &str,
        appointments: Arc<dyn AppointmentApi>,
        documents: Arc<dyn DocumentApi>,
        tracker: Arc<Mutex<DoctorCallTracker>>,
        updates: broadcast::Sender<DoctorCallUpdate>,
        interval: Duration,
    ) -> Self {
        Self {
            appointment_id: appointment_id.to_string(),
            appointments,
            documents,
            tracker,
            updates,
            interval,
        }
    }

    pub async fn tick(&self) -> Result<Vec<DoctorCallEvent>, CallSessionError> {
        let appointment = self.appointments.get(&self.appointment_id).await?;

        let (mut events, patient_id) = {
            let mut tracker = self.tracker.lock().await;
            let events = tracker.observe(&appointment);
            let patient_id = if tracker.wants_documents(&appointment) {
                tracker.view().patient_id.clone()
            } else {
                None
            };
            (events, patient_id)
        };

        if let Some(patient_id) = patient_id {
            match self.documents.list_for_patient(&patient_id).await {
                Ok(documents) => {
                    if let Some(event) = self.tracker.lock().await.absorb_documents(&appointment, documents) {
                        events.push(event);
                    }
                }
                Err(e) => error!("Failed to fetch shared documents for {}: {}", self.appointment_id, e),
            }
        }

        if events.contains(&DoctorCallEvent::CompletionAccepted) {
            match self
                .appointments
                .patch(&self.appointment_id, &AppointmentPatch::finalize_consultation())
                .await
            {
                Ok(()) => events.push(self.tracker.lock().await.mark_finished()),
                Err(e) => error!("Failed to finalize appointment {}: {}", self.appointment_id, e),
            }
        }

        for event in &events {
            info!(appointment_id = %self.appointment_id, ?event, "Doctor call event");
            let _ = self.updates.send(DoctorCallUpdate {
                appointment_id: self.appointment_id.clone(),
                event: event.clone(),
            });
        }

        Ok(events)
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        debug!("Monitoring call {} every {:?}", self.appointment_id, self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let stopping = *shutdown.borrow();
            if stopping || self.tracker.lock().await.is_closed() {
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                result = self.tick() => result,
            };

            match result {
                Ok(_) => {}
                Err(CallSessionError::Api(e)) if e.is_auth() => {
                    warn!("Session rejected by backend, stopping call monitor: {}", e);
                    break;
                }
                Err(e) => error!("Failed to check call {}: {}", self.appointment_id, e),
            }
        }

        debug!("Call monitor for {} stopped", self.appointment_id);
    }
}

// ==============================================================================
// REGISTRY
// ==============================================================================

struct MonitorHandle {
    stop: watch::Sender<bool>,
    tracker: Arc<Mutex<DoctorCallTracker>>,
}

/// One monitor per appointment the doctor has started a call for.
pub struct MonitorRegistry {
    appointments: Arc<dyn AppointmentApi>,
    documents: Arc<dyn DocumentApi>,
    interval: Duration,
    monitors: RwLock<HashMap<String, MonitorHandle>>,
    updates: broadcast::Sender<DoctorCallUpdate>,
}

impl MonitorRegistry {
    pub fn new(
        appointments: Arc<dyn AppointmentApi>,
        documents: Arc<dyn DocumentApi>,
        interval: Duration,
    ) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            appointments,
            documents,
            interval,
            monitors: RwLock::new(HashMap::new()),
            updates,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DoctorCallUpdate> {
        self.updates.subscribe()
    }

    /// Starts monitoring; a monitor already running for the appointment is replaced.
    /// Monitors of calls that have since closed are dropped here.
    pub async fn start(&self, appointment_id: &str, patient_id: Option<String>) {
        self.prune_closed().await;

        let tracker = Arc::new(Mutex::new(DoctorCallTracker::new(
            appointment_id,
            patient_id,
            Utc::now(),
        )));
        let (stop, shutdown) = watch::channel(false);

        let monitor = DoctorCallMonitor::new(
            appointment_id,
            self.appointments.clone(),
            self.documents.clone(),
            tracker.clone(),
            self.updates.clone(),
            self.interval,
        );
        tokio::spawn(monitor.run(shutdown));

        let previous = self
            .monitors
            .write()
            .await
            .insert(appointment_id.to_string(), MonitorHandle { stop, tracker });

        if let Some(previous) = previous {
            let _ = previous.stop.send(true);
        }
        info!("Call monitor started for appointment {}", appointment_id);
    }

    pub async fn stop(&self, appointment_id: &str) -> bool {
        match self.monitors.write().await.remove(appointment_id) {
            Some(handle) => {
                let _ = handle.stop.send(true);
                info!("Call monitor stopped for appointment {}", appointment_id);
                true
            }
            None => false,
        }
    }

    pub async fn stop_all(&self) {
        let mut monitors = self.monitors.write().await;
        for (_, handle) in monitors.drain() {
            let _ = handle.stop.send(true);
        }
    }

    pub async fn view(&self, appointment_id: &str) -> Result<DoctorCallView, CallSessionError> {
        let tracker = self
            .monitors
            .read()
            .await
            .get(appointment_id)
            .map(|handle| handle.tracker.clone())
            .ok_or_else(|| CallSessionError::MonitorNotFound(appointment_id.to_string()))?;

        let view = tracker.lock().await.view().clone();
        Ok(view)
    }

    /// Monitors whose call is still open.
    pub async fn active_count(&self) -> usize {
        let monitors = self.monitors.read().await;
        let mut active = 0;
        for handle in monitors.values() {
            if !handle.tracker.lock().await.is_closed() {
                active += 1;
            }
        }
        active
    }

    async fn prune_closed(&self) {
        let mut monitors = self.monitors.write().await;

        let mut closed = Vec::new();
        for (appointment_id, handle) in monitors.iter() {
            if handle.tracker.lock().await.is_closed() {
                closed.push(appointment_id.clone());
            }
        }

        for appointment_id in closed {
            monitors.remove(&appointment_id);
            debug!("Dropped closed call monitor for appointment {}", appointment_id);
        }
    }
}
