//! # Stack Merge Engine
//!
//! Capacity-aware add/remove on a `StorageUnit`.
//!
//! Capacity counts occupied slots (records), not item quantity. An add
//! first tops up compatible stacks of the same key, which never changes
//! the slot count, and only then opens new slots, each filled to the
//! stack limit before the next is opened. Running out of slots is a
//! partial result, never an error.

use crate::domain::entities::{ItemAttributes, RecordId, StackKey, StackRecord, StorageUnit};
use serde::{Deserialize, Serialize};

/// A stack offered for deposit, typically from a player's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingStack {
    pub key: StackKey,
    pub quantity: u32,
    pub attributes: ItemAttributes,
}

impl IncomingStack {
    pub fn new(key: impl Into<StackKey>, quantity: u32, attributes: ItemAttributes) -> Self {
        Self {
            key: key.into(),
            quantity,
            attributes,
        }
    }
}

/// Outcome of an add.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddResult {
    /// Quantity committed to the unit.
    pub accepted: u32,
    /// Quantity the caller still holds.
    pub remainder: u32,
    /// Slots opened by this add.
    pub new_slots: u32,
}

impl AddResult {
    pub fn is_complete(&self) -> bool {
        self.remainder == 0
    }

    /// Some quantity could not be stored for lack of slots.
    pub fn is_storage_full(&self) -> bool {
        self.remainder > 0
    }
}

impl StorageUnit {
    /// Deposit `quantity` items of `key`.
    pub fn add(&mut self, key: &StackKey, quantity: u32, attributes: &ItemAttributes) -> AddResult {
        if quantity == 0 {
            return AddResult::default();
        }

        let mut remaining = quantity;

        // Merge pass: top up compatible stacks in insertion order.
        if let Some(records) = self.contents.get_mut(key) {
            for record in records.iter_mut() {
                if remaining == 0 {
                    break;
                }
                if !record.attributes.can_stack_with(attributes) {
                    continue;
                }
                let moved = record.room().min(remaining);
                record.quantity += moved;
                remaining -= moved;
            }
        }

        let limit = attributes.stack_limit();
        let mut used = self.used_slots();
        let mut new_slots = 0;

        while remaining > 0 && used < self.capacity {
            let amount = limit.min(remaining);
            let id = self.allocate_record_id();
            self.contents.push(
                key,
                StackRecord {
                    id,
                    quantity: amount,
                    attributes: attributes.clone(),
                },
            );
            remaining -= amount;
            used += 1;
            new_slots += 1;
        }

        AddResult {
            accepted: quantity - remaining,
            remainder: remaining,
            new_slots,
        }
    }

    /// Take up to `amount` from one record. Returns the quantity removed.
    ///
    /// A missing key or record removes nothing. A record reaching zero is
    /// deleted, and so is a key left without records.
    pub fn remove(&mut self, key: &StackKey, record: RecordId, amount: u32) -> u32 {
        let Some(records) = self.contents.get_mut(key) else {
            return 0;
        };
        let Some(index) = records.iter().position(|r| r.id == record) else {
            return 0;
        };

        let removed = amount.min(records[index].quantity);
        records[index].quantity -= removed;

        if records[index].quantity == 0 {
            records.remove(index);
        }
        if records.is_empty() {
            self.contents.remove_key(key);
        }

        removed
    }

    /// Grow capacity. Returns the new capacity.
    pub fn upgrade_capacity(&mut self, increment: u32) -> u32 {
        self.capacity = self.capacity.saturating_add(increment);
        self.capacity
    }

    /// Whether an add of these attributes could merge into an existing stack.
    pub fn has_compatible_stack(&self, key: &StackKey, attributes: &ItemAttributes) -> bool {
        self.contents
            .get(key)
            .is_some_and(|records| records.iter().any(|r| r.attributes.can_stack_with(attributes)))
    }
}
