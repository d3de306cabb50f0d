//! # Envelope Publisher
//!
//! Publishing side of the peer bus.

use crate::envelope::PeerEnvelope;
use crate::subscriber::{EnvelopeStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use singularity_storage::{PeerId, ReplicationMessage, Target, Transport, TransportError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing envelopes to the bus.
#[async_trait]
pub trait EnvelopePublisher: Send + Sync {
    /// Publish an envelope. Returns the number of live receivers.
    async fn publish(&self, envelope: PeerEnvelope) -> usize;

    /// Total envelopes attempted.
    fn envelopes_published(&self) -> u64;
}

/// In-memory peer bus over `tokio::sync::broadcast`.
///
/// Every subscriber sees every envelope and filters on recipient.
pub struct InMemoryPeerBus {
    sender: broadcast::Sender<PeerEnvelope>,

    /// Live subscriptions per peer.
    subscriptions: Arc<RwLock<HashMap<PeerId, usize>>>,

    /// Shared with every endpoint.
    published: Arc<AtomicU64>,

    capacity: usize,
}

impl InMemoryPeerBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            published: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// Receive everything addressed to `peer`.
    #[must_use]
    pub fn subscribe(&self, peer: PeerId) -> Subscription {
        let receiver = self.sender.subscribe();

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(peer).or_insert(0) += 1;
        }

        debug!(peer = %peer, "New subscription created");

        Subscription::new(receiver, peer, self.subscriptions.clone())
    }

    #[must_use]
    pub fn stream(&self, peer: PeerId) -> EnvelopeStream {
        EnvelopeStream::new(self.subscribe(peer))
    }

    /// Synchronous `Transport` that sends as `peer`.
    #[must_use]
    pub fn endpoint(&self, peer: PeerId) -> PeerEndpoint {
        PeerEndpoint {
            peer,
            sender: self.sender.clone(),
            published: self.published.clone(),
        }
    }

    /// Whether anyone is subscribed as `peer`.
    #[must_use]
    pub fn is_connected(&self, peer: PeerId) -> bool {
        self.subscriptions
            .read()
            .map(|subs| subs.get(&peer).copied().unwrap_or(0) > 0)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryPeerBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnvelopePublisher for InMemoryPeerBus {
    async fn publish(&self, envelope: PeerEnvelope) -> usize {
        dispatch(&self.sender, &self.published, envelope).unwrap_or(0)
    }

    fn envelopes_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// A peer's handle for sending on the bus.
#[derive(Clone)]
pub struct PeerEndpoint {
    peer: PeerId,
    sender: broadcast::Sender<PeerEnvelope>,
    published: Arc<AtomicU64>,
}

impl PeerEndpoint {
    pub fn peer(&self) -> PeerId {
        self.peer
    }
}

impl std::fmt::Debug for PeerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerEndpoint").field("peer", &self.peer).finish()
    }
}

impl Transport for PeerEndpoint {
    fn send(&self, message: ReplicationMessage, target: Target) -> Result<(), TransportError> {
        dispatch(
            &self.sender,
            &self.published,
            PeerEnvelope::new(self.peer, target, message),
        )
        .map(|_| ())
    }
}

fn dispatch(
    sender: &broadcast::Sender<PeerEnvelope>,
    published: &AtomicU64,
    envelope: PeerEnvelope,
) -> Result<usize, TransportError> {
    let from = envelope.from;
    let target = envelope.target;
    let kind = envelope.message.kind();

    // Counted even when nobody receives it.
    published.fetch_add(1, Ordering::Relaxed);

    match sender.send(envelope) {
        Ok(receivers) => {
            debug!(from = %from, target = ?target, kind = %kind, receivers, "Envelope published");
            Ok(receivers)
        }
        Err(e) => {
            warn!(from = %from, target = ?target, kind = %kind, error = %e, "Envelope dropped (no receivers)");
            Err(TransportError::Disconnected)
        }
    }
}
