// libs/dashboard-cell/src/services/poller.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use shared_config::AppConfig;
use shared_models::auth::UserType;

use crate::models::DashboardError;
use crate::services::Dashboard;

#[derive(Debug, Clone, Copy)]
enum Job {
    Badges,
    Readiness,
    Appointments,
}

/// Keeps the [`Dashboard`] cache fresh. Readiness and appointment refreshes
/// only run for doctors.
pub struct DashboardPoller {
    dashboard: Arc<Dashboard>,
    role: UserType,
    badge_interval: Duration,
    readiness_interval: Duration,
    appointment_interval: Duration,
}

impl DashboardPoller {
    pub fn new(dashboard: Arc<Dashboard>, role: UserType, config: &AppConfig) -> Self {
        Self {
            dashboard,
            role,
            badge_interval: config.badge_poll_interval(),
            readiness_interval: config.readiness_poll_interval(),
            appointment_interval: config.appointment_refresh_interval(),
        }
    }

    async fn run_job(&self, job: Job) -> Result<(), DashboardError> {
        match job {
            Job::Badges => self.dashboard.refresh_badges().await.map(|_| ()),
            Job::Readiness => self.dashboard.refresh_readiness().await.map(|_| ()),
            Job::Appointments => self.dashboard.refresh_appointments().await.map(|_| ()),
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let is_doctor = self.role == UserType::Doctor;
        info!("Starting dashboard poller for {}", self.role);

        let mut badges = interval(self.badge_interval);
        let mut readiness = interval(self.readiness_interval);
        let mut appointments = interval(self.appointment_interval);
        for ticker in [&mut badges, &mut readiness, &mut appointments] {
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        loop {
            let job = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = badges.tick() => Job::Badges,
                _ = readiness.tick(), if is_doctor => Job::Readiness,
                _ = appointments.tick(), if is_doctor => Job::Appointments,
            };

            let result = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                result = self.run_job(job) => result,
            };

            match result {
                Ok(()) => {}
                Err(DashboardError::Api(e)) if e.is_auth() => {
                    warn!("Session rejected by backend, stopping dashboard poller: {}", e);
                    break;
                }
                Err(DashboardError::NotSignedIn) => {
                    info!("Signed out, stopping dashboard poller");
                    break;
                }
                Err(e) => error!("Dashboard {:?} refresh failed: {}", job, e),
            }
        }

        info!("Dashboard poller stopped");
    }
}
