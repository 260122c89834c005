// libs/call-session-cell/src/lib.rs
//! # Call Session Cell
//!
//! Polling-driven call signaling between a doctor and a patient, layered on
//! top of the appointment record.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------------------------+
//! |                    Call Session Cell                      |
//! +-----------------------------------------------------------+
//! |  models.rs         |  Phases, intents, effects, events    |
//! |  services/                                                |
//! |    handled.rs      |  Appointment ids already acted upon  |
//! |    reducer.rs      |  Pure state transitions              |
//! |    session.rs      |  Shared state + snapshot broadcast   |
//! |    poller.rs       |  Patient incoming-call poller        |
//! |    dispatcher.rs   |  Intents -> PATCH /appointments/{id} |
//! |    doctor.rs       |  Doctor call actions                 |
//! |    monitor.rs      |  Doctor active-call monitor          |
//! |  context.rs        |  Wiring for the local HTTP surface   |
//! |  handlers.rs       |  HTTP endpoint handlers              |
//! |  router.rs         |  Route definitions                   |
//! +-----------------------------------------------------------+
//! ```
//!
//! The reducer never performs I/O. Pollers feed it appointment snapshots,
//! the dispatcher feeds it user intents and executes the effects it returns,
//! and subscribers receive a [`CallSnapshot`] after every change.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use call_session_cell::{CallContext, SessionPoller};
//! use shared_api::{RestClient, SessionStore};
//! use shared_config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env();
//! let session = Arc::new(SessionStore::from_config(&config));
//! let client = Arc::new(RestClient::new(&config, session)?);
//!
//! let context = Arc::new(CallContext::new(&config, client));
//! let (_stop, shutdown) = tokio::sync::watch::channel(false);
//!
//! let poller = SessionPoller::new(
//!     context.appointments.clone(),
//!     context.call_session.clone(),
//!     context.session_store.clone(),
//!     config.user_id.clone(),
//!     config.call_poll_interval(),
//! );
//! tokio::spawn(poller.run(shutdown));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use context::CallContext;

pub use models::{
    ActiveCall, CallEffect, CallEvent, CallIntent, CallParty, CallPhase, CallSessionError,
    CallSnapshot, DispatchOutcome, DoctorCallEvent, DoctorCallUpdate, DoctorCallView,
    DocumentStep, IncomingCall, Navigation,
};

pub use services::{
    ActionDispatcher, CallSession, CallState, DoctorCallMonitor, DoctorCallService,
    DoctorCallTracker, HandledSet, MonitorRegistry, SessionPoller,
};

pub use router::call_session_routes;
