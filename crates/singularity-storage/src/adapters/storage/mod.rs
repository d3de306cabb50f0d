//! Storage Adapters
//!
//! Implementations of the `UnitStore` trait.

mod file;
mod memory;

pub use file::FileUnitStore;
pub use memory::InMemoryUnitStore;
