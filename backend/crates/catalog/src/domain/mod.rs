//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Value objects (Barcode, ProductName, ClientAddress, ClientUuid)
//! - Entities (ReportEntry, ProductRecord, UsageTotals)
//! - Store key namespaces
//! - Repository traits (interfaces)

pub mod entities;
pub mod keys;
pub mod repository;
pub mod value_objects;
