//! # Replication Protocol
//!
//! Lets non-authoritative peers view and mutate units owned by the
//! authoritative process.
//!
//! - `messages` - Wire types
//! - `host` - Authoritative request handler
//! - `peer` - Per-viewer session state machine
//!
//! ```text
//! PeerSession                       HostHandler
//!   Idle ──ViewRequest{seq}──────────→ query → ViewResponse{seq}
//!   AwaitingResponse ←────────────────┘
//!   Idle (page shown)
//!   ──TransferRequest{seq}───────────→ add/remove → TransferResult{seq}
//!                                      observer → ChangeNotification (broadcast)
//!   ←──────────────────────────────────┘ re-request view
//! ```

pub mod host;
pub mod messages;
pub mod peer;

pub use host::{HandleOutcome, HostHandler, Role};
pub use messages::{
    MessageKind, PeerId, ReplicationMessage, ReplicationPayload, Target, TransferOp,
};
pub use peer::{PeerSession, PeerView, PollOutcome, SessionEvent, SessionState};
