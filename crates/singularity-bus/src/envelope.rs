//! # Peer Envelope
//!
//! Routing wrapper around a replication message. The envelope's `from`
//! is the only sender identity a receiver should trust.

use singularity_storage::{PeerId, ReplicationMessage, Target};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEnvelope {
    pub from: PeerId,
    pub target: Target,
    pub message: ReplicationMessage,
}

impl PeerEnvelope {
    pub fn new(from: PeerId, target: Target, message: ReplicationMessage) -> Self {
        Self {
            from,
            target,
            message,
        }
    }

    /// Whether `peer` should receive this envelope. Senders never receive
    /// their own broadcasts.
    pub fn is_for(&self, peer: PeerId) -> bool {
        self.from != peer && self.target.includes(peer)
    }
}
