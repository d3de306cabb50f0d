//! # Singularity Test Suite
//!
//! Cross-crate tests: one authoritative host and several viewing peers
//! wired together over the in-process peer bus.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Merge and query throughput (criterion)
//! └── src/integration/
//!     ├── harness.rs            # HostNode / PeerNode fixtures
//!     ├── replication_flow.rs   # view, transfer, refresh, retry
//!     ├── persistence_flow.rs   # checkpoints through the file store
//!     └── telemetry.rs          # subscriber installation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p singularity-tests
//! cargo test -p singularity-tests integration::replication_flow::
//! cargo bench -p singularity-tests
//! ```

#![allow(dead_code)]
