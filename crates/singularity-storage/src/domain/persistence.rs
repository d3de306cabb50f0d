//! # Persisted Form
//!
//! JSON envelope of one unit. Keys are an ordered list so display order
//! survives a reload.
//!
//! Each record carries a readable summary next to `blob`, the hex of the
//! codec-encoded `ItemAttributes`. Only `blob` is read back.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedUnit {
    pub id: String,
    pub capacity: u32,
    #[serde(default)]
    pub items: Vec<PersistedStack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedStack {
    pub key: String,
    #[serde(default)]
    pub records: Vec<PersistedRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub quantity: u32,
    #[serde(default)]
    pub display_name: String,
    pub blob: String,
}

impl PersistedUnit {
    pub fn record_count(&self) -> usize {
        self.items.iter().map(|stack| stack.records.len()).sum()
    }
}
