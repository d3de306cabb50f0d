//! # Storage Service
//!
//! Owns every loaded unit of the hosting session and implements
//! `StorageApi` on top of them.
//!
//! ## Architecture
//!
//! This service:
//! 1. Loads units lazily on first access (`cache.rs`)
//! 2. Runs all merge and query operations on its own units (`storage.rs`)
//! 3. Notifies a `ContentObserver` after every committed mutation
//! 4. Writes units back only on `flush_all()`
//!
//! Built per session and dropped with it; nothing here is global.

mod cache;
pub mod codec;
mod storage;

use crate::adapters::{InMemoryUnitStore, JsonItemCodec, NoopObserver};
use crate::domain::classification::ClassificationRegistry;
use crate::domain::config::StorageConfig;
use crate::domain::entities::{StorageUnit, UnitId};
use crate::ports::outbound::{ContentObserver, ItemCodec, UnitStore};
use std::collections::HashMap;

pub use cache::FlushReport;

/// The Storage Service.
pub struct StorageService<S, C, O>
where
    S: UnitStore,
    C: ItemCodec,
    O: ContentObserver,
{
    /// Durable medium.
    pub(crate) store: S,
    /// Attribute blob encoding.
    pub(crate) codec: C,
    /// Told about committed mutations.
    pub(crate) observer: O,
    pub(crate) registry: ClassificationRegistry,
    pub(crate) config: StorageConfig,
    /// Loaded units. Only `cache.rs` inserts or evicts.
    pub(crate) units: HashMap<UnitId, StorageUnit>,
}

/// Dependencies for StorageService
pub struct StorageDependencies<S, C, O> {
    pub store: S,
    pub codec: C,
    pub observer: O,
    pub registry: ClassificationRegistry,
}

impl<S, C, O> StorageService<S, C, O>
where
    S: UnitStore,
    C: ItemCodec,
    O: ContentObserver,
{
    /// Create a service with an empty cache.
    pub fn new(deps: StorageDependencies<S, C, O>, config: StorageConfig) -> Self {
        Self {
            store: deps.store,
            codec: deps.codec,
            observer: deps.observer,
            registry: deps.registry,
            config,
            units: HashMap::new(),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn registry(&self) -> &ClassificationRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn is_cached(&self, id: &UnitId) -> bool {
        self.units.contains_key(id)
    }

    pub fn cached_count(&self) -> usize {
        self.units.len()
    }
}

impl StorageService<InMemoryUnitStore, JsonItemCodec, NoopObserver> {
    /// Memory-only service with the standard taxonomy.
    pub fn in_memory(config: StorageConfig) -> Self {
        Self::new(
            StorageDependencies {
                store: InMemoryUnitStore::new(),
                codec: JsonItemCodec,
                observer: NoopObserver,
                registry: ClassificationRegistry::standard(),
            },
            config,
        )
    }
}
