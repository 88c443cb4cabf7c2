//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::session::Session;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(rename = "Result")]
    pub result: &'static str,
    pub valid_until: DateTime<Utc>,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            result: "OK",
            valid_until: session.valid_until,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    #[serde(rename = "Result")]
    pub result: &'static str,
}

impl Default for LogoutResponse {
    fn default() -> Self {
        Self { result: "OK" }
    }
}
