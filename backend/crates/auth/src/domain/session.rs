//! Moderator Session Entity

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a minted session token
pub const TOKEN_LEN: usize = 60;

/// Opaque bearer token carried in the session cookie
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Mint a fresh random token
    pub fn mint() -> Self {
        Self(platform::crypto::random_alphanumeric(TOKEN_LEN))
    }

    /// Wrap a token presented by a client; it is only meaningful after a store lookup
    pub fn from_client(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "SessionToken({prefix}***)")
    }
}

/// Where a session stands at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Before the renew deadline
    Fresh,
    /// Past the renew deadline, before the hard expiry
    RenewDue,
    /// Past the hard expiry
    Expired,
}

/// Deadlines of one moderator session, stored as UNIX seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub renew_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub valid_until: DateTime<Utc>,
}

impl Session {
    pub fn issue(now: DateTime<Utc>, renew_after: Duration, valid_for: Duration) -> Self {
        let now = now.trunc_subsecs(0);
        Self {
            renew_at: now + renew_after,
            valid_until: now + valid_for,
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> SessionStatus {
        if now > self.valid_until {
            SessionStatus::Expired
        } else if now > self.renew_at {
            SessionStatus::RenewDue
        } else {
            SessionStatus::Fresh
        }
    }

    /// Seconds until the hard expiry, used as cookie Max-Age
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.valid_until - now).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_720_000_000, 0).unwrap()
    }

    #[test]
    fn test_status_transitions() {
        let session = Session::issue(start(), Duration::hours(1), Duration::days(60));

        assert_eq!(session.status_at(start()), SessionStatus::Fresh);
        assert_eq!(
            session.status_at(start() + Duration::hours(1)),
            SessionStatus::Fresh
        );
        assert_eq!(
            session.status_at(start() + Duration::hours(1) + Duration::seconds(1)),
            SessionStatus::RenewDue
        );
        assert_eq!(
            session.status_at(start() + Duration::days(60) + Duration::seconds(1)),
            SessionStatus::Expired
        );
    }

    #[test]
    fn test_remaining_secs() {
        let session = Session::issue(start(), Duration::hours(1), Duration::days(60));
        assert_eq!(session.remaining_secs(start()), 60 * 24 * 3600);
        assert_eq!(session.remaining_secs(start() + Duration::days(61)), 0);
    }

    #[test]
    fn test_deadlines_serialize_as_unix_seconds() {
        let session = Session::issue(
            start() + Duration::milliseconds(750),
            Duration::hours(1),
            Duration::days(60),
        );
        let json = serde_json::to_value(session).unwrap();
        assert_eq!(json["renew_at"], 1_720_000_000 + 3600);
        assert_eq!(json["valid_until"], 1_720_000_000 + 60 * 24 * 3600);
        assert_eq!(serde_json::from_value::<Session>(json).unwrap(), session);
    }

    #[test]
    fn test_token_shape_and_debug() {
        let token = SessionToken::mint();
        assert_eq!(token.as_str().len(), TOKEN_LEN);
        assert!(token.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!format!("{token:?}").contains(token.as_str()));
    }
}
