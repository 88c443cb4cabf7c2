//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod session_manager;
pub mod sign_in;

// Re-exports
pub use config::AuthConfig;
pub use session_manager::{SessionCheck, SessionManager};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
