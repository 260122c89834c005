// libs/call-session-cell/src/services/session.rs
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use appointment_cell::Appointment;

use crate::models::{CallEffect, CallEvent, CallIntent, CallPhase, CallSessionError, CallSnapshot};
use crate::services::reducer::CallState;

const SNAPSHOT_CHANNEL_CAPACITY: usize = 32;

struct Inner {
    state: CallState,
    version: u64,
}

impl Inner {
    fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            version: self.version,
            phase: self.state.phase.clone(),
            handled: self.state.handled.ids(),
        }
    }
}

/// Shared patient call state. The poller and the dispatcher both write
/// through here; every change is published as a [`CallSnapshot`].
pub struct CallSession {
    inner: RwLock<Inner>,
    updates: broadcast::Sender<CallSnapshot>,
}

impl Default for CallSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CallSession {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(Inner {
                state: CallState::new(),
                version: 0,
            }),
            updates,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CallSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> CallSnapshot {
        self.inner.read().await.snapshot()
    }

    pub async fn phase(&self) -> CallPhase {
        self.inner.read().await.state.phase.clone()
    }

    pub async fn handled(&self) -> Vec<String> {
        self.inner.read().await.state.handled.ids()
    }

    pub async fn observe(&self, appointments: &[Appointment]) -> Vec<CallEvent> {
        let mut inner = self.inner.write().await;
        let before = inner.state.phase.clone();
        let events = inner.state.observe(appointments);

        for event in &events {
            info!(?event, "Call event");
        }

        if !events.is_empty() || inner.state.phase != before {
            self.publish(&mut inner);
        }

        events
    }

    pub async fn apply(
        &self,
        intent: CallIntent,
    ) -> Result<(Vec<CallEffect>, CallPhase), CallSessionError> {
        let mut inner = self.inner.write().await;
        let effects = inner.state.apply(intent)?;
        let phase = inner.state.phase.clone();
        self.publish(&mut inner);
        Ok((effects, phase))
    }

    /// Drops all call state, e.g. on logout.
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.state = CallState::new();
        self.publish(&mut inner);
        info!("Call session reset");
    }

    fn publish(&self, inner: &mut Inner) {
        inner.version += 1;
        let snapshot = inner.snapshot();
        debug!("Publishing call snapshot v{} ({})", snapshot.version, snapshot.phase.name());
        // No subscribers is fine.
        let _ = self.updates.send(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::MockPortalResponses;

    fn started(id: &str) -> Appointment {
        serde_json::from_value(MockPortalResponses::started_appointment(id)).unwrap()
    }

    #[tokio::test]
    async fn test_changes_are_published_with_increasing_versions() {
        let session = CallSession::new();
        let mut updates = session.subscribe();

        session.observe(&[started("a1")]).await;
        let first = updates.recv().await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(first.phase.name(), "incoming");

        session.apply(CallIntent::Accept).await.unwrap();
        let second = updates.recv().await.unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(second.handled, vec!["a1".to_string()]);
    }

    #[tokio::test]
    async fn test_quiet_polls_publish_nothing() {
        let session = CallSession::new();
        let mut updates = session.subscribe();

        session.observe(&[]).await;
        assert!(updates.try_recv().is_err());
        assert_eq!(session.snapshot().await.version, 0);
    }

    #[tokio::test]
    async fn test_reset_clears_handled() {
        let session = CallSession::new();
        session.observe(&[started("a1")]).await;
        session.apply(CallIntent::Decline).await.unwrap();
        assert_eq!(session.handled().await, vec!["a1".to_string()]);

        session.reset().await;
        assert!(session.handled().await.is_empty());
        assert_eq!(session.phase().await, CallPhase::Idle);
    }
}
