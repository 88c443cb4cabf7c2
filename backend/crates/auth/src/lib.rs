//! Moderator Authentication
//!
//! Clean Architecture structure:
//! - `domain/` - Session entity, token, session store trait
//! - `application/` - Session manager and sign-in use case
//! - `infra/` - File-backed and in-memory session stores
//! - `presentation/` - Login/logout handlers, session middleware, router
//!
//! ## Session Model
//! - One configured moderator account, no user database
//! - Sessions carry a soft renew deadline (1h) and a hard expiry (60d)
//! - Past the renew deadline a token is rotated on its next use
//! - Past the hard expiry a token is deleted and rejected
//! - Every mutation is persisted before it becomes visible

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::session_manager::{SessionCheck, SessionManager};
pub use domain::repository::SessionStore;
pub use error::{AuthError, AuthResult};
pub use infra::file::FileSessionStore;
pub use infra::memory::MemorySessionStore;
pub use presentation::handlers::AuthAppState;
pub use presentation::middleware::require_moderator_session;
pub use presentation::router::{auth_router, protect};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
