//! # Singularity Bus - In-Process Peer Transport
//!
//! Carries `ReplicationMessage`s between one authoritative host and any
//! number of viewing peers living in the same process (tests, local
//! split-screen). Each send is wrapped in a `PeerEnvelope` naming the
//! sender and the recipient.
//!
//! ```text
//! ┌──────────────┐  PeerEndpoint::send()   ┌──────────────┐
//! │  Peer (2)    │ ──────┐                 │  Host (0)    │
//! └──────────────┘       ▼                 └──────────────┘
//!                  ┌──────────────┐               ↑
//!                  │ InMemoryPeer │ ──────────────┘
//!                  │     Bus      │   Subscription::recv()
//!                  └──────────────┘   (recipient filter)
//! ```
//!
//! Delivery is best effort: a subscriber that lags behind the channel
//! capacity loses the oldest envelopes, which the replication protocol
//! tolerates through sequence numbers and retries.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod envelope;
pub mod publisher;
pub mod subscriber;

pub use envelope::PeerEnvelope;
pub use publisher::{EnvelopePublisher, InMemoryPeerBus, PeerEndpoint};
pub use subscriber::{EnvelopeStream, Subscription, SubscriptionError};

/// Maximum envelopes to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
