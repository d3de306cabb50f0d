//! # Unit Envelope Codec
//!
//! Converts a live unit to and from its JSON envelope. Attribute blobs go
//! through the injected `ItemCodec` and are hex-encoded in the envelope.

use crate::domain::entities::{StackKey, StackRecord, StorageUnit, UnitId};
use crate::domain::errors::CodecError;
use crate::domain::persistence::{PersistedRecord, PersistedStack, PersistedUnit};
use crate::ports::outbound::ItemCodec;

/// A record skipped while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    pub key: String,
    /// Position within the key's record list.
    pub index: usize,
    pub reason: String,
}

/// Result of decoding an envelope.
#[derive(Debug)]
pub struct DecodedUnit {
    pub unit: StorageUnit,
    pub dropped: Vec<DroppedRecord>,
    /// Declared capacity, when it had to be raised to fit the records.
    pub raised_from: Option<u32>,
    /// Envelope id, when it differed from the requested one.
    pub foreign_id: Option<String>,
}

pub fn encode_unit<C: ItemCodec>(unit: &StorageUnit, codec: &C) -> Result<Vec<u8>, CodecError> {
    let mut items = Vec::with_capacity(unit.contents().key_count());

    for (key, records) in unit.contents().iter() {
        let records = records
            .iter()
            .map(|record| -> Result<PersistedRecord, CodecError> {
                Ok(PersistedRecord {
                    quantity: record.quantity,
                    display_name: record.attributes.display_name.clone(),
                    blob: hex::encode(codec.encode(&record.attributes)?),
                })
            })
            .collect::<Result<Vec<_>, CodecError>>()?;

        items.push(PersistedStack {
            key: key.as_str().to_string(),
            records,
        });
    }

    let envelope = PersistedUnit {
        id: unit.id().as_str().to_string(),
        capacity: unit.capacity(),
        items,
    };

    serde_json::to_vec_pretty(&envelope).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode an envelope into a unit named `id`.
///
/// Fails only when the envelope itself is unreadable. Records with a bad
/// blob or a zero quantity are dropped and reported.
pub fn decode_unit<C: ItemCodec>(
    id: &UnitId,
    bytes: &[u8],
    codec: &C,
) -> Result<DecodedUnit, CodecError> {
    let envelope: PersistedUnit =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;

    let mut unit = StorageUnit::new(id.clone(), envelope.capacity);
    let mut dropped = Vec::new();

    for stack in envelope.items {
        let key = StackKey::new(stack.key.as_str());

        for (index, persisted) in stack.records.into_iter().enumerate() {
            if persisted.quantity == 0 {
                dropped.push(DroppedRecord {
                    key: stack.key.clone(),
                    index,
                    reason: "zero quantity".to_string(),
                });
                continue;
            }

            let attributes = hex::decode(&persisted.blob)
                .map_err(|e| CodecError::Decode(e.to_string()))
                .and_then(|raw| codec.decode(&raw));

            match attributes {
                Ok(attributes) => {
                    let record_id = unit.allocate_record_id();
                    unit.contents.push(
                        &key,
                        StackRecord {
                            id: record_id,
                            quantity: persisted.quantity,
                            attributes,
                        },
                    );
                }
                Err(e) => dropped.push(DroppedRecord {
                    key: stack.key.clone(),
                    index,
                    reason: e.to_string(),
                }),
            }
        }
    }

    let used = unit.used_slots();
    let raised_from = (used > unit.capacity).then(|| {
        let declared = unit.capacity;
        unit.capacity = used;
        declared
    });

    let foreign_id = (envelope.id != id.as_str()).then_some(envelope.id);

    Ok(DecodedUnit {
        unit,
        dropped,
        raised_from,
        foreign_id,
    })
}
