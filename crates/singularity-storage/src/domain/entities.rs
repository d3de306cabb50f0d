//! # Core Domain Entities
//!
//! The storage unit, its stacks, and the read-only views handed out to
//! callers.
//!
//! Only `domain::merge` mutates quantities. Everything else sees
//! `ItemView`/`UnitSnapshot` copies.

use crate::domain::classification::ClassId;
use crate::domain::errors::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable storage unit identifier, assigned once and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Wrap an identifier, rejecting empty or whitespace-only input.
    pub fn new(id: impl Into<String>) -> Result<Self, StorageError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(StorageError::InvalidUnitId);
        }
        Ok(Self(id))
    }

    /// Mint a fresh identifier for a newly placed unit.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ids that arrive through deserialization bypass `new()`.
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for UnitId {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Qualified item id deciding stackability, e.g. `(O)388`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackKey(String);

impl StackKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StackKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for StackKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for StackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle of one stack inside a unit.
///
/// Monotonic per unit and never reused while the unit stays cached, so a
/// stale handle can only miss, never hit a different stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Full attribute set of an item instance.
///
/// `payload` carries whatever the host item model needs beyond these
/// fields; the engine never looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemAttributes {
    pub display_name: String,
    pub class_id: ClassId,
    pub max_stack_size: u32,
    #[serde(default)]
    pub quality: u8,
    #[serde(default)]
    pub payload: Vec<u8>,
}

impl ItemAttributes {
    pub fn new(display_name: impl Into<String>, class_id: ClassId, max_stack_size: u32) -> Self {
        Self {
            display_name: display_name.into(),
            class_id,
            max_stack_size,
            quality: 0,
            payload: Vec::new(),
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Effective stack limit; a declared limit of 0 means unstackable.
    pub fn stack_limit(&self) -> u32 {
        self.max_stack_size.max(1)
    }

    pub fn can_stack_with(&self, other: &ItemAttributes) -> bool {
        self == other
    }
}

/// One occupied slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRecord {
    pub id: RecordId,
    pub quantity: u32,
    pub attributes: ItemAttributes,
}

impl StackRecord {
    pub fn room(&self) -> u32 {
        self.attributes.stack_limit().saturating_sub(self.quantity)
    }
}

/// Stacks of a unit grouped by key, keys kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitContents {
    order: Vec<StackKey>,
    stacks: HashMap<StackKey, Vec<StackRecord>>,
}

impl UnitContents {
    pub fn get(&self, key: &StackKey) -> Option<&[StackRecord]> {
        self.stacks.get(key).map(Vec::as_slice)
    }

    pub(crate) fn get_mut(&mut self, key: &StackKey) -> Option<&mut Vec<StackRecord>> {
        self.stacks.get_mut(key)
    }

    pub(crate) fn push(&mut self, key: &StackKey, record: StackRecord) {
        match self.stacks.get_mut(key) {
            Some(records) => records.push(record),
            None => {
                self.order.push(key.clone());
                self.stacks.insert(key.clone(), vec![record]);
            }
        }
    }

    pub(crate) fn remove_key(&mut self, key: &StackKey) {
        if self.stacks.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    /// Total record count across keys.
    pub fn slot_count(&self) -> usize {
        self.stacks.values().map(Vec::len).sum()
    }

    pub fn key_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys and their records in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&StackKey, &[StackRecord])> {
        self.order
            .iter()
            .filter_map(|key| self.stacks.get(key).map(|records| (key, records.as_slice())))
    }
}

/// A virtualized container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUnit {
    pub(crate) id: UnitId,
    pub(crate) capacity: u32,
    pub(crate) contents: UnitContents,
    pub(crate) next_record_id: u64,
}

impl StorageUnit {
    pub fn new(id: UnitId, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            contents: UnitContents::default(),
            next_record_id: 1,
        }
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn contents(&self) -> &UnitContents {
        &self.contents
    }

    pub fn used_slots(&self) -> u32 {
        u32::try_from(self.contents.slot_count()).unwrap_or(u32::MAX)
    }

    /// `(used, max)` slot counts.
    pub fn counts(&self) -> (u32, u32) {
        (self.used_slots(), self.capacity)
    }

    pub fn is_full(&self) -> bool {
        self.used_slots() >= self.capacity
    }

    pub fn record(&self, key: &StackKey, record: RecordId) -> Option<&StackRecord> {
        self.contents.get(key)?.iter().find(|r| r.id == record)
    }

    /// Total quantity held under a key.
    pub fn quantity_of(&self, key: &StackKey) -> u64 {
        self.contents
            .get(key)
            .map(|records| records.iter().map(|r| u64::from(r.quantity)).sum())
            .unwrap_or(0)
    }

    pub(crate) fn allocate_record_id(&mut self) -> RecordId {
        let id = RecordId(self.next_record_id);
        self.next_record_id += 1;
        id
    }

    /// Flattened contents in display order.
    pub fn views(&self) -> Vec<ItemView> {
        self.contents
            .iter()
            .flat_map(|(key, records)| {
                records.iter().map(move |record| ItemView {
                    unit: self.id.clone(),
                    key: key.clone(),
                    record: record.id,
                    quantity: record.quantity,
                    attributes: record.attributes.clone(),
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id.clone(),
            capacity: self.capacity,
            used: self.used_slots(),
            items: self.views(),
        }
    }
}

/// Read-only copy of one stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub unit: UnitId,
    pub key: StackKey,
    pub record: RecordId,
    pub quantity: u32,
    pub attributes: ItemAttributes,
}

impl ItemView {
    pub fn class_id(&self) -> ClassId {
        self.attributes.class_id
    }

    pub fn display_name(&self) -> &str {
        &self.attributes.display_name
    }
}

/// Read-only copy of a whole unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub capacity: u32,
    pub used: u32,
    pub items: Vec<ItemView>,
}
