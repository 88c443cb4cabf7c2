//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Client identity resolution (forwarded headers, peer address)
//! - Cryptographic utilities (SHA-256, session token minting, constant-time compare)
//! - Moderator credential verification (plain or Argon2id PHC)
//! - Cookie management
//! - Wall clock abstraction
//! - Daily rate window arithmetic

pub mod client;
pub mod clock;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
