//! HTTP Handlers

use axum::{Extension, Json};
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use platform::client::resolve_client_address;
use platform::clock::Clock;
use platform::cookie::{CookieConfig, extract_cookie};
use platform::rate_limit::FailureLockout;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_manager::SessionManager;
use crate::application::sign_in::{SignInInput, SignInUseCase};
use crate::domain::repository::SessionStore;
use crate::domain::session::SessionToken;
use crate::error::AuthResult;
use crate::presentation::dto::{LoginRequest, LoginResponse, LogoutResponse};

/// Shared state for auth handlers and the session middleware
pub struct AuthAppState<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    pub sessions: Arc<SessionManager<S>>,
    /// Failed-login tracker, shared with the admin statistics
    pub lockout: Arc<FailureLockout>,
}

impl<S> Clone for AuthAppState<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            lockout: self.lockout.clone(),
        }
    }
}

impl<S> AuthAppState<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let lockout = Arc::new(FailureLockout::new(config.lockout, clock.clone()));
        Self {
            sessions: Arc::new(SessionManager::new(store, Arc::new(config), clock)),
            lockout,
        }
    }

    pub fn cookie(&self) -> &CookieConfig {
        &self.sessions.config().cookie
    }

    /// Token from the session cookie, if any
    pub fn presented_token(&self, headers: &HeaderMap) -> Option<SessionToken> {
        extract_cookie(headers, &self.cookie().name).map(SessionToken::from_client)
    }
}

/// POST /login
pub async fn login<S>(
    State(state): State<AuthAppState<S>>,
    peer: Option<Extension<ConnectInfo<SocketAddr>>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: SessionStore + Send + Sync + 'static,
{
    let address = resolve_client_address(&headers, peer.map(|Extension(ConnectInfo(addr))| addr));
    let use_case = SignInUseCase::new(state.sessions.clone(), state.lockout.clone());
    let output = use_case
        .execute(SignInInput {
            address,
            user: req.user,
            password: req.password,
        })
        .await?;

    let max_age = output.session.remaining_secs(state.sessions.now());
    let cookie = state.cookie().set_cookie_header(output.token.as_str(), max_age);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse::from(output.session)),
    ))
}

/// POST /logout
pub async fn logout<S>(
    State(state): State<AuthAppState<S>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    S: SessionStore + Send + Sync + 'static,
{
    if let Some(token) = state.presented_token(&headers) {
        state.sessions.logout(&token).await?;
    }

    Ok((
        [(header::SET_COOKIE, state.cookie().delete_cookie_header())],
        Json(LogoutResponse::default()),
    ))
}
