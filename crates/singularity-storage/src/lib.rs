//! # Singularity Storage
//!
//! Virtualized storage units that hold far more stacks than a native
//! container, persisted separately from the host save and viewable by
//! several peers at once.
//!
//! ## Role in System
//!
//! - **Single Source of Truth**: the authoritative process owns every loaded
//!   `StorageUnit` through `StorageService`
//! - **Replicas Never Mutate**: non-authoritative peers drive a `PeerSession`
//!   that turns view and transfer intents into `ReplicationMessage`s
//! - **Checkpoint Persistence**: units are loaded lazily and flushed only at
//!   explicit checkpoints
//!
//! ## Request Flow
//!
//! ```text
//! [Replica UI] ──PeerSession──→ ViewRequest ──→ [Transport] ──→ HostHandler
//!                                                                  │
//!                     get → apply_filter → page  ←─ StorageService ┘
//!                                                                  │
//! [Replica UI] ←──PeerSession── ViewResponse ←── [Transport] ←─────┘
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | Occupied slots never exceed capacity | `domain/merge.rs` - `add()` |
//! | 2 | Merge before opening a new slot | `domain/merge.rs` - first pass |
//! | 3 | No zero-quantity record survives | `domain/merge.rs` - `remove()`, load path |
//! | 4 | Capacity only grows | `domain/merge.rs` - `upgrade_capacity()` |
//! | 5 | Corrupt records never poison a unit | `service/codec.rs` - `decode_unit()` |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Units, stack merging, classification, queries, config, errors
//! - `ports/` - Inbound API and outbound SPI traits
//! - `adapters/` - Unit stores, item codecs, observers, clocks
//! - `service/` - The storage service: unit cache plus the inbound API
//! - `ipc/` - Replication messages, authoritative handler, peer session

pub mod adapters;
pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

pub use domain::classification::{
    ClassId, ClassificationEntry, ClassificationRegistry, GroupFilter, ItemGroup,
};
pub use domain::config::{ReplicationConfig, StorageConfig, UpgradeTier};
pub use domain::entities::{
    ItemAttributes, ItemView, RecordId, StackKey, StackRecord, StorageUnit, UnitId, UnitSnapshot,
};
pub use domain::errors::{CodecError, PersistenceError, StorageError, TransportError};
pub use domain::merge::{AddResult, IncomingStack};
pub use domain::query::{ItemQuery, QueryPage, DEFAULT_PAGE_SIZE};
pub use ipc::{
    HandleOutcome, HostHandler, MessageKind, PeerId, PeerSession, PeerView, PollOutcome,
    ReplicationMessage, ReplicationPayload, Role, SessionEvent, SessionState, Target, TransferOp,
};
pub use ports::inbound::{LocationContext, MaterialSourceProvider, StorageApi};
pub use ports::outbound::{ContentObserver, ItemCodec, TimeSource, Transport, UnitStore};
pub use service::{FlushReport, StorageDependencies, StorageService};
