//! # Outbound Ports (Driven Ports)
//!
//! Interfaces the host environment implements for the storage core.
//! In-process implementations live in `adapters/`.

use crate::domain::entities::{ItemAttributes, UnitId};
use crate::domain::errors::{CodecError, PersistenceError, TransportError};
use crate::ipc::messages::{ReplicationMessage, Target};

/// Durable medium holding one serialized blob per unit.
///
/// Testing: `InMemoryUnitStore`
/// Production: `FileUnitStore`
pub trait UnitStore: Send + Sync {
    /// `Ok(None)` when nothing was ever written for `id`.
    fn read_unit(&self, id: &UnitId) -> Result<Option<Vec<u8>>, PersistenceError>;

    fn write_unit(&mut self, id: &UnitId, bytes: &[u8]) -> Result<(), PersistenceError>;

    /// Whether anything was ever written for `id`.
    fn contains_unit(&self, id: &UnitId) -> Result<bool, PersistenceError> {
        Ok(self.read_unit(id)?.is_some())
    }
}

/// Full-fidelity encoding of an item's attribute set.
pub trait ItemCodec: Send + Sync {
    fn encode(&self, attributes: &ItemAttributes) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<ItemAttributes, CodecError>;
}

/// Told about every committed mutation.
pub trait ContentObserver: Send + Sync {
    fn on_content_changed(&self, unit: &UnitId);
}

/// Multiplayer messaging. Delivery may be unordered and lossy.
pub trait Transport: Send + Sync {
    fn send(&self, message: ReplicationMessage, target: Target) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, message: ReplicationMessage, target: Target) -> Result<(), TransportError> {
        (**self).send(message, target)
    }
}

impl<O: ContentObserver + ?Sized> ContentObserver for std::sync::Arc<O> {
    fn on_content_changed(&self, unit: &UnitId) {
        (**self).on_content_changed(unit)
    }
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now(&self) -> u64;
}

