use crate::domain::entities::{ItemAttributes, UnitId};
use crate::domain::errors::{PersistenceError, TransportError};
use crate::ipc::messages::{ReplicationMessage, Target};
use crate::ports::outbound::{Transport, UnitStore};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub fn unit_id(id: &str) -> UnitId {
    UnitId::new(id).unwrap()
}

pub fn wood() -> ItemAttributes {
    ItemAttributes::new("Wood", -16, 999)
}

pub fn item(name: &str, class: i32, max_stack: u32) -> ItemAttributes {
    ItemAttributes::new(name, class, max_stack)
}

/// Records every sent message instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LoopbackTransport {
    sent: Arc<Mutex<Vec<(ReplicationMessage, Target)>>>,
    offline: Arc<Mutex<bool>>,
}

impl LoopbackTransport {
    pub fn sent(&self) -> Vec<(ReplicationMessage, Target)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<(ReplicationMessage, Target)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }
}

impl Transport for LoopbackTransport {
    fn send(&self, message: ReplicationMessage, target: Target) -> Result<(), TransportError> {
        if *self.offline.lock().unwrap() {
            return Err(TransportError::Disconnected);
        }
        self.sent.lock().unwrap().push((message, target));
        Ok(())
    }
}

/// In-memory store whose writes fail for chosen units.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub inner: crate::adapters::InMemoryUnitStore,
    pub fail_writes: HashSet<UnitId>,
    pub fail_reads: bool,
}

impl UnitStore for FailingStore {
    fn read_unit(&self, id: &UnitId) -> Result<Option<Vec<u8>>, PersistenceError> {
        if self.fail_reads {
            return Err(PersistenceError::Unavailable {
                reason: "no save loaded".to_string(),
            });
        }
        self.inner.read_unit(id)
    }

    fn write_unit(&mut self, id: &UnitId, bytes: &[u8]) -> Result<(), PersistenceError> {
        if self.fail_writes.contains(id) {
            return Err(PersistenceError::Io {
                message: "disk full".to_string(),
            });
        }
        self.inner.write_unit(id, bytes)
    }
}
