use crate::domain::entities::UnitId;
use crate::domain::errors::PersistenceError;
use crate::ports::outbound::UnitStore;
use std::collections::HashMap;

/// In-memory unit store for unit tests and single-session hosts.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUnitStore {
    data: HashMap<UnitId, Vec<u8>>,
}

impl InMemoryUnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed raw bytes, bypassing the service.
    pub fn insert_raw(&mut self, id: &UnitId, bytes: impl Into<Vec<u8>>) {
        self.data.insert(id.clone(), bytes.into());
    }

    pub fn raw(&self, id: &UnitId) -> Option<&[u8]> {
        self.data.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl UnitStore for InMemoryUnitStore {
    fn read_unit(&self, id: &UnitId) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.data.get(id).cloned())
    }

    fn write_unit(&mut self, id: &UnitId, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.data.insert(id.clone(), bytes.to_vec());
        Ok(())
    }

    fn contains_unit(&self, id: &UnitId) -> Result<bool, PersistenceError> {
        Ok(self.data.contains_key(id))
    }
}
