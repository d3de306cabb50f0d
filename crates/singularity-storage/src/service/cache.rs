//! # Unit Cache
//!
//! Lazy load on first access, write-back on `flush_units`, eviction on
//! `evict_all`. A missing or unreadable unit is created empty, and so is
//! one whose stored envelope names a different unit.

use super::codec::{decode_unit, encode_unit};
use super::StorageService;
use crate::domain::config::StorageConfig;
use crate::domain::entities::{StorageUnit, UnitId};
use crate::domain::errors::StorageError;
use crate::ports::outbound::{ContentObserver, ItemCodec, UnitStore};
use std::collections::hash_map::Entry;
use tracing::{debug, error, info, warn};

/// Outcome of a flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: usize,
    pub failed: Vec<UnitId>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<S, C, O> StorageService<S, C, O>
where
    S: UnitStore,
    C: ItemCodec,
    O: ContentObserver,
{
    /// Cached unit, loading or creating it on first access.
    pub(crate) fn unit_mut(&mut self, id: &UnitId) -> Result<&mut StorageUnit, StorageError> {
        if !id.is_valid() {
            return Err(StorageError::InvalidUnitId);
        }

        let unit = match self.units.entry(id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(load_unit(&self.store, &self.codec, &self.config, id))
            }
        };
        Ok(unit)
    }

    /// Cached or persisted, without loading it.
    pub(crate) fn is_known(&self, id: &UnitId) -> bool {
        if !id.is_valid() {
            return false;
        }
        if self.units.contains_key(id) {
            return true;
        }
        self.store.contains_unit(id).unwrap_or_else(|e| {
            warn!(unit = %id, error = %e, "Could not check store for unit");
            false
        })
    }

    pub(crate) fn flush_units(&mut self) -> FlushReport {
        info!(units = self.units.len(), "Flushing storage units");

        let mut report = FlushReport::default();
        for (id, unit) in &self.units {
            let written = encode_unit(unit, &self.codec)
                .map_err(StorageError::from)
                .and_then(|bytes| {
                    self.store
                        .write_unit(id, &bytes)
                        .map_err(StorageError::from)
                });

            match written {
                Ok(()) => report.written += 1,
                Err(e) => {
                    error!(unit = %id, error = %e, "Failed to write storage unit");
                    report.failed.push(id.clone());
                }
            }
        }

        if !report.is_clean() {
            warn!(
                written = report.written,
                failed = report.failed.len(),
                "Flush finished with failures"
            );
        }
        report
    }

    pub(crate) fn evict_all(&mut self) {
        debug!(units = self.units.len(), "Clearing storage cache");
        self.units.clear();
    }
}

fn load_unit<S: UnitStore, C: ItemCodec>(
    store: &S,
    codec: &C,
    config: &StorageConfig,
    id: &UnitId,
) -> StorageUnit {
    let fresh = || StorageUnit::new(id.clone(), config.default_capacity);

    let bytes = match store.read_unit(id) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!(unit = %id, capacity = config.default_capacity, "Creating new storage unit");
            return fresh();
        }
        Err(e) => {
            warn!(unit = %id, error = %e, "Storage unit unreadable, starting empty");
            return fresh();
        }
    };

    let decoded = match decode_unit(id, &bytes, codec) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(unit = %id, error = %e, "Corrupt storage unit envelope, starting empty");
            return fresh();
        }
    };

    if let Some(foreign) = &decoded.foreign_id {
        warn!(unit = %id, stored_id = %foreign, "Persisted unit belongs to another id, starting empty");
        return fresh();
    }

    for dropped in &decoded.dropped {
        warn!(
            unit = %id,
            key = %dropped.key,
            index = dropped.index,
            reason = %dropped.reason,
            "Dropped corrupt stack record"
        );
    }
    if let Some(declared) = decoded.raised_from {
        warn!(
            unit = %id,
            declared,
            capacity = decoded.unit.capacity(),
            "Persisted capacity below record count, raised"
        );
    }
    debug!(
        unit = %id,
        used = decoded.unit.used_slots(),
        capacity = decoded.unit.capacity(),
        "Loaded storage unit"
    );
    decoded.unit
}
