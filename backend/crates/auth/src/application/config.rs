//! Application Configuration
//!
//! Configuration for the moderator session layer.

use chrono::Duration;
use platform::password::StoredPassword;
use platform::rate_limit::LockoutPolicy;

/// Re-export cookie types from platform
pub use platform::cookie::{CookieConfig, SameSite};

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Moderator user name
    pub user: String,
    /// Moderator password, plain or Argon2id PHC
    pub password: StoredPassword,
    /// Soft deadline after which a token is rotated on use (1 hour)
    pub renew_after: Duration,
    /// Hard expiry of a session (60 days)
    pub valid_for: Duration,
    /// Pause before answering a failed login
    pub login_failure_delay: std::time::Duration,
    /// Failed logins per address before it is locked out (10 per 6 hours)
    pub lockout: LockoutPolicy,
    pub cookie: CookieConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user: "admin".to_string(),
            password: StoredPassword::Plain("admin".to_string()),
            renew_after: Duration::hours(1),
            valid_for: Duration::days(60),
            login_failure_delay: std::time::Duration::from_secs(3),
            lockout: LockoutPolicy::default(),
            cookie: CookieConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Config for development (insecure cookie, no login delay)
    pub fn development() -> Self {
        Self {
            login_failure_delay: std::time::Duration::ZERO,
            cookie: CookieConfig {
                secure: false,
                ..CookieConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: &str) -> Self {
        self.user = user.into();
        self.password = StoredPassword::from_config(password);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.renew_after, Duration::hours(1));
        assert_eq!(config.valid_for, Duration::days(60));
        assert_eq!(config.lockout.max_failures, 10);
        assert_eq!(config.lockout.window, Duration::hours(6));
        assert!(config.cookie.secure);
        assert!(!AuthConfig::development().cookie.secure);
    }

    #[test]
    fn test_with_credentials() {
        let config = AuthConfig::default().with_credentials("mod", "$argon2id$v=19$abc");
        assert_eq!(config.user, "mod");
        assert!(matches!(config.password, StoredPassword::Argon2(_)));
    }
}
