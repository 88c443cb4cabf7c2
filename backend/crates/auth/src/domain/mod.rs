//! Domain Layer
//!
//! Session entity, token and the session store trait.

pub mod repository;
pub mod session;

// Re-exports
pub use repository::SessionStore;
pub use session::{Session, SessionStatus, SessionToken};
