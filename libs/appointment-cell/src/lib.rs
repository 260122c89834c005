//! # Appointment Cell
//!
//! Typed access to the portal's appointment records and patient documents.
//! The appointment record is also the signaling channel for calls: the
//! doctor sets `appointment_started`, the patient answers through
//! `call_status` / `patient_joined`, and both sides negotiate document
//! sharing and consultation completion through the request-status fields.

pub mod models;
pub mod services;

pub use models::{
    Appointment, AppointmentMode, AppointmentPatch, AppointmentStatus, CallStatus,
    DoctorInfo, PatientDocument, RequestStatus,
};

pub use services::{AppointmentApi, AppointmentService, DocumentApi, DocumentService};
