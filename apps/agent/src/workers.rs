use tokio::sync::{broadcast::error::RecvError, watch};
use tracing::{info, warn};

use call_session_cell::SessionPoller;
use dashboard_cell::DashboardPoller;
use shared_config::AppConfig;
use shared_models::auth::{SessionEvent, UserType};

use crate::router::AgentState;

/// Starts the background pollers for the configured identity.
pub async fn spawn(config: &AppConfig, state: &AgentState, shutdown: watch::Receiver<bool>) {
    let Some(session) = state.session_store.current().await else {
        warn!("No portal identity configured; background pollers not started");
        return;
    };

    if session.user_type == UserType::Patient {
        let poller = SessionPoller::new(
            state.calls.appointments.clone(),
            state.calls.call_session.clone(),
            state.session_store.clone(),
            session.user_id.clone(),
            config.call_poll_interval(),
        );
        tokio::spawn(poller.run(shutdown.clone()));
    }

    let dashboard = DashboardPoller::new(state.dashboard.clone(), session.user_type, config);
    tokio::spawn(dashboard.run(shutdown.clone()));

    tokio::spawn(clear_on_session_end(state.clone(), shutdown));

    info!("Background pollers started for {} {}", session.user_type, session.user_id);
}

/// Call and dashboard state is session-scoped; drop it when the session ends.
async fn clear_on_session_end(state: AgentState, mut shutdown: watch::Receiver<bool>) {
    let mut events = state.session_store.subscribe();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            event = events.recv() => match event {
                Ok(SessionEvent::LoggedOut) | Ok(SessionEvent::Expired { .. }) => {
                    state.clear().await;
                }
                Ok(SessionEvent::LoggedIn { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} session events", skipped);
                    state.clear().await;
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}
