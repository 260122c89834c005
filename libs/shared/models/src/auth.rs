use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Portal role, sent to the backend as the `user_type` query parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Patient,
    Doctor,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Patient => "patient",
            UserType::Doctor => "doctor",
            UserType::Admin => "admin",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(UserType::Patient),
            "doctor" => Ok(UserType::Doctor),
            "admin" => Ok(UserType::Admin),
            other => Err(format!("unknown user type '{}'", other)),
        }
    }
}

/// Signed-in identity. Lives only as long as the agent session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSession {
    pub user_type: UserType,
    pub user_id: String,
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn { user_type: UserType, user_id: String },
    LoggedOut,
    Expired { reason: String },
}
