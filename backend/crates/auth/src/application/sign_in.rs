//! Sign In Use Case
//!
//! Checks the moderator credentials and opens a session. An address that
//! keeps failing is locked out for the lockout window before any credential
//! check runs.

use platform::crypto::constant_time_eq;
use platform::rate_limit::FailureLockout;
use std::sync::Arc;

use crate::application::session_manager::SessionManager;
use crate::domain::repository::SessionStore;
use crate::domain::session::{Session, SessionToken};
use crate::error::{AuthError, AuthResult};

pub struct SignInInput {
    /// Resolved client address the attempt is charged to
    pub address: String,
    pub user: String,
    pub password: String,
}

pub struct SignInOutput {
    pub token: SessionToken,
    pub session: Session,
}

pub struct SignInUseCase<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    sessions: Arc<SessionManager<S>>,
    lockout: Arc<FailureLockout>,
}

impl<S> SignInUseCase<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(sessions: Arc<SessionManager<S>>, lockout: Arc<FailureLockout>) -> Self {
        Self { sessions, lockout }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        let config = self.sessions.config();

        if self.lockout.is_blocked(&input.address) {
            return Err(AuthError::TooManyAttempts);
        }

        // Both checks always run
        let user_ok = constant_time_eq(config.user.as_bytes(), input.user.as_bytes());
        let password_ok = config.password.verify(&input.password)?;

        if !(user_ok && password_ok) {
            if self.lockout.record_failure(&input.address) {
                tracing::warn!(address = %input.address, "Address locked out after failed logins");
            }
            tokio::time::sleep(config.login_failure_delay).await;
            return Err(AuthError::InvalidCredentials);
        }

        self.lockout.clear(&input.address);
        let (token, session) = self.sessions.create().await?;
        Ok(SignInOutput { token, session })
    }
}
