//! # Storage API Implementation
//!
//! Implements `StorageApi` plus the bulk deposit helpers used by the
//! storage menu ("store all", "fill existing stacks").

use super::*;
use crate::domain::config::UpgradeTier;
use crate::domain::entities::{ItemAttributes, ItemView, RecordId, StackKey, UnitSnapshot};
use crate::domain::errors::StorageError;
use crate::domain::merge::{AddResult, IncomingStack};
use crate::domain::query::{apply_filter, ItemQuery, QueryPage};
use crate::ports::inbound::{LocationContext, MaterialSourceProvider, StorageApi};
use tracing::{info, trace, warn};

impl<S, C, O> StorageApi for StorageService<S, C, O>
where
    S: UnitStore,
    C: ItemCodec,
    O: ContentObserver,
{
    fn get(&mut self, id: &UnitId) -> Result<UnitSnapshot, StorageError> {
        Ok(self.unit_mut(id)?.snapshot())
    }

    fn contains(&self, id: &UnitId) -> bool {
        self.is_known(id)
    }

    fn add(
        &mut self,
        id: &UnitId,
        key: &StackKey,
        quantity: u32,
        attributes: &ItemAttributes,
    ) -> Result<AddResult, StorageError> {
        let result = self.deposit(id, key, quantity, attributes)?;
        if result.accepted > 0 {
            self.observer.on_content_changed(id);
        }
        Ok(result)
    }

    fn remove(
        &mut self,
        id: &UnitId,
        key: &StackKey,
        record: RecordId,
        amount: u32,
    ) -> Result<u32, StorageError> {
        let removed = self.unit_mut(id)?.remove(key, record, amount);
        if removed > 0 {
            trace!(unit = %id, key = %key, record = %record, removed, "Withdrew from stack");
            self.observer.on_content_changed(id);
        }
        Ok(removed)
    }

    fn upgrade_capacity(&mut self, id: &UnitId, increment: u32) -> Result<u32, StorageError> {
        let unit = self.unit_mut(id)?;
        let previous = unit.capacity();
        let capacity = unit.upgrade_capacity(increment);

        if capacity != previous {
            info!(unit = %id, previous, capacity, "Storage unit upgraded");
            self.observer.on_content_changed(id);
        }
        Ok(capacity)
    }

    fn counts(&mut self, id: &UnitId) -> Result<(u32, u32), StorageError> {
        Ok(self.unit_mut(id)?.counts())
    }

    fn query(
        &mut self,
        id: &UnitId,
        query: &ItemQuery,
        page_index: usize,
        page_size: usize,
    ) -> Result<QueryPage, StorageError> {
        let size = if page_size == 0 {
            self.config.page_size
        } else {
            page_size
        };
        let views = self.unit_mut(id)?.views();
        let filtered = apply_filter(views, query, &self.registry);
        Ok(QueryPage::from_filtered(&filtered, page_index, size))
    }

    fn flush_all(&mut self) -> FlushReport {
        self.flush_units()
    }

    fn clear(&mut self) {
        self.evict_all();
    }
}

impl<S, C, O> StorageService<S, C, O>
where
    S: UnitStore,
    C: ItemCodec,
    O: ContentObserver,
{
    /// Add without notifying.
    fn deposit(
        &mut self,
        id: &UnitId,
        key: &StackKey,
        quantity: u32,
        attributes: &ItemAttributes,
    ) -> Result<AddResult, StorageError> {
        let unit = self.unit_mut(id)?;
        let result = unit.add(key, quantity, attributes);

        if result.new_slots > 0 {
            trace!(unit = %id, key = %key, new_slots = result.new_slots, "Opened new stacks");
        }
        if result.is_storage_full() {
            let (used, capacity) = unit.counts();
            warn!(
                unit = %id,
                key = %key,
                accepted = result.accepted,
                remainder = result.remainder,
                used,
                capacity,
                "Storage full, deposit partially rejected"
            );
        }
        Ok(result)
    }

    /// Deposit every stack in order ("store all"). One result per input.
    pub fn add_batch(
        &mut self,
        id: &UnitId,
        stacks: &[IncomingStack],
    ) -> Result<Vec<AddResult>, StorageError> {
        let mut results = Vec::with_capacity(stacks.len());
        for stack in stacks {
            results.push(self.deposit(id, &stack.key, stack.quantity, &stack.attributes)?);
        }

        if results.iter().any(|r| r.accepted > 0) {
            self.observer.on_content_changed(id);
        }
        Ok(results)
    }

    /// Deposit only stacks the unit already holds a compatible record for.
    /// Skipped stacks come back as `None`.
    pub fn fill_existing_stacks(
        &mut self,
        id: &UnitId,
        stacks: &[IncomingStack],
    ) -> Result<Vec<Option<AddResult>>, StorageError> {
        let mut results = Vec::with_capacity(stacks.len());
        for stack in stacks {
            let known = self
                .unit_mut(id)?
                .has_compatible_stack(&stack.key, &stack.attributes);
            let result = if known {
                Some(self.deposit(id, &stack.key, stack.quantity, &stack.attributes)?)
            } else {
                None
            };
            results.push(result);
        }

        if results.iter().flatten().any(|r| r.accepted > 0) {
            self.observer.on_content_changed(id);
        }
        Ok(results)
    }

    /// Apply an upgrade item.
    pub fn apply_upgrade(&mut self, id: &UnitId, tier: UpgradeTier) -> Result<u32, StorageError> {
        let increment = self.config.upgrade_increment(tier);
        self.upgrade_capacity(id, increment)
    }

    /// Unfiltered contents in display order.
    pub fn all_items(&mut self, id: &UnitId) -> Result<Vec<ItemView>, StorageError> {
        Ok(self.unit_mut(id)?.views())
    }
}

impl<S, C, O> MaterialSourceProvider for StorageService<S, C, O>
where
    S: UnitStore,
    C: ItemCodec,
    O: ContentObserver,
{
    fn list_material_sources(&mut self, location: &LocationContext) -> Vec<UnitSnapshot> {
        location
            .units
            .iter()
            .filter_map(|id| match self.unit_mut(id) {
                Ok(unit) => Some(unit.snapshot()),
                Err(e) => {
                    warn!(location = %location.name, error = %e, "Skipping material source");
                    None
                }
            })
            .collect()
    }
}
