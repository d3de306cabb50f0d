//! # Envelope Subscriber
//!
//! Receiving side of the peer bus.

use crate::envelope::PeerEnvelope;
use singularity_storage::PeerId;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Peer bus closed")]
    Closed,
}

/// Envelopes addressed to one peer. Dropping it disconnects the peer.
pub struct Subscription {
    receiver: broadcast::Receiver<PeerEnvelope>,
    peer: PeerId,
    subscriptions: Arc<RwLock<HashMap<PeerId, usize>>>,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<PeerEnvelope>,
        peer: PeerId,
        subscriptions: Arc<RwLock<HashMap<PeerId, usize>>>,
    ) -> Self {
        Self {
            receiver,
            peer,
            subscriptions,
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Next envelope for this peer, `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<PeerEnvelope> {
        loop {
            let envelope = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(peer = %self.peer, lagged = count, "Subscriber lagged, envelopes dropped");
                    continue;
                }
            };

            if envelope.is_for(self.peer) {
                return Some(envelope);
            }
        }
    }

    /// Non-blocking receive. `Ok(None)` when nothing is waiting.
    pub fn try_recv(&mut self) -> Result<Option<PeerEnvelope>, SubscriptionError> {
        loop {
            let envelope = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if envelope.is_for(self.peer) {
                return Ok(Some(envelope));
            }
        }
    }

    /// Everything currently waiting for this peer.
    pub fn drain(&mut self) -> Vec<PeerEnvelope> {
        let mut drained = Vec::new();
        while let Ok(Some(envelope)) = self.try_recv() {
            drained.push(envelope);
        }
        drained
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Ok(mut subs) = self.subscriptions.write() else {
            return;
        };
        if let Some(count) = subs.get_mut(&self.peer) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                subs.remove(&self.peer);
            }
        }
        debug!(peer = %self.peer, "Subscription dropped");
    }
}

/// `Stream` adapter over a subscription.
pub struct EnvelopeStream {
    subscription: Subscription,
}

impl EnvelopeStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    pub fn peer(&self) -> PeerId {
        self.subscription.peer()
    }
}

impl Stream for EnvelopeStream {
    type Item = PeerEnvelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.subscription.try_recv() {
            Ok(Some(envelope)) => Poll::Ready(Some(envelope)),
            Ok(None) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}
