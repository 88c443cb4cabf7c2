//! Presentation Layer - HTTP handlers and routing

pub mod admin;
pub mod dto;
pub mod extract;
pub mod handlers;
pub mod router;
