//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and the store.
//! Contains use case implementations.

pub mod config;
pub mod dedup;
pub mod import;
pub mod moderation;
pub mod ranking;
pub mod rate_limiter;
pub mod telemetry;
