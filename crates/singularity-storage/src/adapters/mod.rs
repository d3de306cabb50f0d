//! # Adapters Module
//!
//! In-process implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `storage`: unit stores (memory, one JSON file per unit)
//! - `codec`: item attribute codecs (JSON, bincode)
//! - `notifier`: content observers
//! - `infra`: clocks

pub mod codec;
pub mod infra;
pub mod notifier;
pub mod storage;

pub use codec::{BincodeItemCodec, JsonItemCodec};
pub use infra::{ManualTimeSource, SystemTimeSource};
pub use notifier::{BroadcastNotifier, NoopObserver, RecordingObserver};
pub use storage::{FileUnitStore, InMemoryUnitStore};
