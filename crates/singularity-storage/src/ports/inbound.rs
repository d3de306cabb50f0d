//! # Inbound Ports (Driving Ports)
//!
//! API consumed by UI and content code. Non-authoritative processes reach
//! the same operations through `ipc::PeerSession` instead.

use crate::domain::entities::{ItemAttributes, RecordId, StackKey, UnitId, UnitSnapshot};
use crate::domain::errors::StorageError;
use crate::domain::merge::AddResult;
use crate::domain::query::{ItemQuery, QueryPage};
use crate::service::FlushReport;

/// Storage API on the authoritative process.
///
/// Every call taking a `UnitId` loads the unit on first use. A blank id is
/// the only error a lookup reports; a missing unit is created empty.
pub trait StorageApi {
    /// Read-only snapshot of a unit.
    fn get(&mut self, id: &UnitId) -> Result<UnitSnapshot, StorageError>;

    /// Whether the unit is cached or was ever persisted. Never loads or
    /// creates it.
    fn contains(&self, id: &UnitId) -> bool;

    /// Deposit items. Lack of slots shows up as `remainder`.
    fn add(
        &mut self,
        id: &UnitId,
        key: &StackKey,
        quantity: u32,
        attributes: &ItemAttributes,
    ) -> Result<AddResult, StorageError>;

    /// Withdraw from one stack. Returns the quantity removed.
    fn remove(
        &mut self,
        id: &UnitId,
        key: &StackKey,
        record: RecordId,
        amount: u32,
    ) -> Result<u32, StorageError>;

    /// Returns the new capacity.
    fn upgrade_capacity(&mut self, id: &UnitId, increment: u32) -> Result<u32, StorageError>;

    /// `(used, max)` slots.
    fn counts(&mut self, id: &UnitId) -> Result<(u32, u32), StorageError>;

    /// Filtered page of a unit. A `page_size` of 0 uses the configured size.
    fn query(
        &mut self,
        id: &UnitId,
        query: &ItemQuery,
        page_index: usize,
        page_size: usize,
    ) -> Result<QueryPage, StorageError>;

    /// Write every cached unit. Failures are isolated per unit.
    fn flush_all(&mut self) -> FlushReport;

    /// Drop every cached unit without writing.
    fn clear(&mut self);
}

/// Units placed in one location, as seen by a crafting menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationContext {
    pub name: String,
    pub units: Vec<UnitId>,
}

impl LocationContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: UnitId) -> Self {
        self.units.push(unit);
        self
    }
}

/// Exposes units as read-only material containers for crafting.
pub trait MaterialSourceProvider {
    fn list_material_sources(&mut self, location: &LocationContext) -> Vec<UnitSnapshot>;
}
