//! Infrastructure Layer - Store and feed implementations

pub mod feed;
pub mod memory;
pub mod redis;
