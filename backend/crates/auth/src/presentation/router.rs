//! Auth Router

use axum::{Router, middleware, routing::post};

use crate::domain::repository::SessionStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_moderator_session;

/// `/login` and `/logout`
pub fn auth_router<S>(state: AuthAppState<S>) -> Router
where
    S: SessionStore + Send + Sync + 'static,
{
    Router::new()
        .route("/login", post(handlers::login::<S>))
        .route("/logout", post(handlers::logout::<S>))
        .with_state(state)
}

/// Put every route of `router` behind the moderator session check
pub fn protect<S>(router: Router, state: AuthAppState<S>) -> Router
where
    S: SessionStore + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(
        state,
        require_moderator_session::<S>,
    ))
}
