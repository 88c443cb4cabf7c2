//! Shared Kernel - vocabulary every barcode federation crate agrees on
//!
//! This crate contains only the pieces whose meaning is identical across
//! the catalog engine, the moderator sessions and the API binary:
//! - The unified error type and its result alias
//! - The error classification and its HTTP status mapping
//! - The JSON error body handlers answer with (`axum` feature)

pub mod error {
    pub mod app_error;
    pub mod kind;
    #[cfg(feature = "axum")]
    pub mod response;
}
