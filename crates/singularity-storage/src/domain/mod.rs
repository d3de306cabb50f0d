//! # Domain Layer
//!
//! Pure storage logic. Nothing in here performs I/O or logs.
//!
//! ## Modules
//!
//! - `entities` - Unit, stack records, snapshots and identifiers
//! - `merge` - Capacity-aware add/remove and capacity upgrades
//! - `classification` - Static class taxonomy used by filters
//! - `query` - Filter pipeline and pagination
//! - `persistence` - On-disk envelope of a unit
//! - `config` - Storage and replication configuration
//! - `errors` - Error types

pub mod classification;
pub mod config;
pub mod entities;
pub mod errors;
pub mod merge;
pub mod persistence;
pub mod query;
