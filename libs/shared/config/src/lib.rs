use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_AGENT_ADDR: &str = "127.0.0.1:4000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub user_type: String,
    pub user_id: String,
    pub auth_token: Option<String>,
    pub agent_addr: String,
    pub call_poll_interval_ms: u64,
    pub call_monitor_interval_ms: u64,
    pub readiness_poll_interval_ms: u64,
    pub badge_poll_interval_ms: u64,
    pub appointment_refresh_interval_ms: u64,
    pub http_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_type: String::new(),
            user_id: String::new(),
            auth_token: None,
            agent_addr: DEFAULT_AGENT_ADDR.to_string(),
            call_poll_interval_ms: 3_000,
            call_monitor_interval_ms: 2_000,
            readiness_poll_interval_ms: 5_000,
            badge_poll_interval_ms: 10_000,
            appointment_refresh_interval_ms: 30_000,
            http_timeout_ms: 10_000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            api_base_url: env::var("PORTAL_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("PORTAL_API_BASE_URL not set, using default");
                    defaults.api_base_url.clone()
                }),
            user_type: env::var("PORTAL_USER_TYPE")
                .unwrap_or_else(|_| {
                    warn!("PORTAL_USER_TYPE not set, using empty value");
                    String::new()
                }),
            user_id: env::var("PORTAL_USER_ID")
                .unwrap_or_else(|_| {
                    warn!("PORTAL_USER_ID not set, using empty value");
                    String::new()
                }),
            auth_token: env::var("PORTAL_AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
            agent_addr: env::var("PORTAL_AGENT_ADDR")
                .unwrap_or_else(|_| defaults.agent_addr.clone()),
            call_poll_interval_ms: interval_from_env("CALL_POLL_INTERVAL_MS", defaults.call_poll_interval_ms),
            call_monitor_interval_ms: interval_from_env("CALL_MONITOR_INTERVAL_MS", defaults.call_monitor_interval_ms),
            readiness_poll_interval_ms: interval_from_env("READINESS_POLL_INTERVAL_MS", defaults.readiness_poll_interval_ms),
            badge_poll_interval_ms: interval_from_env("BADGE_POLL_INTERVAL_MS", defaults.badge_poll_interval_ms),
            appointment_refresh_interval_ms: interval_from_env(
                "APPOINTMENT_REFRESH_INTERVAL_MS",
                defaults.appointment_refresh_interval_ms,
            ),
            http_timeout_ms: interval_from_env("HTTP_TIMEOUT_MS", defaults.http_timeout_ms),
        };

        if !config.is_configured() {
            warn!("Portal agent not fully configured - missing user identity");
        }

        config
    }

    /// A signed-in identity is required before any poller can run.
    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
            && !self.user_type.is_empty()
            && !self.user_id.is_empty()
    }

    pub fn call_poll_interval(&self) -> Duration {
        Duration::from_millis(self.call_poll_interval_ms)
    }

    pub fn call_monitor_interval(&self) -> Duration {
        Duration::from_millis(self.call_monitor_interval_ms)
    }

    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms)
    }

    pub fn badge_poll_interval(&self) -> Duration {
        Duration::from_millis(self.badge_poll_interval_ms)
    }

    pub fn appointment_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.appointment_refresh_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

fn interval_from_env(key: &str, default_ms: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(0) | Err(_) => {
                warn!("{} has invalid value '{}', using {}ms", key, raw, default_ms);
                default_ms
            }
            Ok(ms) => ms,
        },
        Err(_) => default_ms,
    }
}
