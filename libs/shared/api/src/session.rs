use std::str::FromStr;

use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_models::auth::{SessionEvent, UserSession, UserType};

/// Session-scoped identity store. Cleared on logout and when the backend
/// rejects the session's credentials.
pub struct SessionStore {
    current: RwLock<Option<UserSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(session: Option<UserSession>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            current: RwLock::new(session),
            events,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        if !config.is_configured() {
            return Self::new(None);
        }

        match UserType::from_str(&config.user_type) {
            Ok(user_type) => Self::new(Some(UserSession {
                user_type,
                user_id: config.user_id.clone(),
                auth_token: config.auth_token.clone(),
            })),
            Err(e) => {
                warn!("Ignoring configured identity: {}", e);
                Self::new(None)
            }
        }
    }

    pub async fn current(&self) -> Option<UserSession> {
        self.current.read().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .and_then(|s| s.auth_token.clone())
    }

    pub async fn login(&self, session: UserSession) {
        info!("Session started for {} {}", session.user_type, session.user_id);
        let event = SessionEvent::LoggedIn {
            user_type: session.user_type,
            user_id: session.user_id.clone(),
        };
        *self.current.write().await = Some(session);
        let _ = self.events.send(event);
    }

    pub async fn logout(&self) {
        let previous = self.current.write().await.take();
        if previous.is_some() {
            info!("Session cleared on logout");
            let _ = self.events.send(SessionEvent::LoggedOut);
        }
    }

    /// Drops the identity after an authorization failure.
    pub async fn expire(&self, reason: &str) {
        let previous = self.current.write().await.take();
        if previous.is_some() {
            warn!("Session expired: {}", reason);
            let _ = self.events.send(SessionEvent::Expired {
                reason: reason.to_string(),
            });
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
