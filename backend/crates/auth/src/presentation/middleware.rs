//! Session Middleware
//!
//! Guards moderator routes. A token past its renew deadline is rotated and
//! the replacement cookie is attached to the downstream response.

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::session_manager::SessionCheck;
use crate::domain::repository::SessionStore;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Middleware that requires a valid moderator session
pub async fn require_moderator_session<S>(
    State(state): State<AuthAppState<S>>,
    req: Request,
    next: Next,
) -> Response
where
    S: SessionStore + Send + Sync + 'static,
{
    let Some(token) = state.presented_token(req.headers()) else {
        return unauthorized(&state);
    };

    match state.sessions.validate(&token).await {
        Ok(SessionCheck::Valid(_)) => next.run(req).await,
        Ok(SessionCheck::Rotated { token, session }) => {
            let mut response = next.run(req).await;
            let max_age = session.remaining_secs(state.sessions.now());
            response.headers_mut().append(
                header::SET_COOKIE,
                state.cookie().set_cookie_header(token.as_str(), max_age),
            );
            response
        }
        Err(AuthError::SessionInvalid) => unauthorized(&state),
        Err(e) => e.into_response(),
    }
}

fn unauthorized<S>(state: &AuthAppState<S>) -> Response
where
    S: SessionStore + Send + Sync + 'static,
{
    let mut response = AuthError::SessionInvalid.into_response();
    let headers = response.headers_mut();
    headers.insert("X-Auth-Required", HeaderValue::from_static("true"));
    headers.append(header::SET_COOKIE, state.cookie().delete_cookie_header());
    response
}
