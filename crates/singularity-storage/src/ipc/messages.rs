//! # Replication Messages
//!
//! Every message names the unit it concerns. Requests carry a
//! per-session `sequence` that the reply echoes, so a peer can discard
//! late answers to requests it has since replaced.

use crate::domain::entities::{ItemAttributes, RecordId, StackKey, UnitId};
use crate::domain::errors::TransportError;
use crate::domain::query::{ItemQuery, QueryPage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process identifier on the multiplayer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Recipient of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Peer(PeerId),
    Broadcast,
}

impl Target {
    pub fn includes(&self, peer: PeerId) -> bool {
        match self {
            Target::Peer(target) => *target == peer,
            Target::Broadcast => true,
        }
    }
}

/// A logical add or remove forwarded to the authoritative process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferOp {
    Deposit {
        key: StackKey,
        quantity: u32,
        attributes: ItemAttributes,
    },
    Withdraw {
        key: StackKey,
        record: RecordId,
        amount: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicationPayload {
    /// Peer asks for one filtered page.
    ViewRequest {
        sequence: u64,
        page_index: usize,
        page_size: usize,
        query: ItemQuery,
    },
    /// Host answers a view request. `used`/`capacity` feed the slot counter.
    ViewResponse {
        sequence: u64,
        page: QueryPage,
        used: u32,
        capacity: u32,
    },
    TransferRequest {
        sequence: u64,
        op: TransferOp,
    },
    /// Host tells the sender how much actually moved.
    TransferResult {
        sequence: u64,
        moved: u32,
        remainder: u32,
    },
    /// Contents of the unit changed; viewers should re-request.
    ChangeNotification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ViewRequest,
    ViewResponse,
    TransferRequest,
    TransferResult,
    ChangeNotification,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::ViewRequest => "view-request",
            MessageKind::ViewResponse => "view-response",
            MessageKind::TransferRequest => "transfer-request",
            MessageKind::TransferResult => "transfer-result",
            MessageKind::ChangeNotification => "change-notification",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationMessage {
    pub unit_id: UnitId,
    pub payload: ReplicationPayload,
}

impl ReplicationMessage {
    pub fn new(unit_id: UnitId, payload: ReplicationPayload) -> Self {
        Self { unit_id, payload }
    }

    pub fn change_notification(unit_id: UnitId) -> Self {
        Self::new(unit_id, ReplicationPayload::ChangeNotification)
    }

    pub fn kind(&self) -> MessageKind {
        match self.payload {
            ReplicationPayload::ViewRequest { .. } => MessageKind::ViewRequest,
            ReplicationPayload::ViewResponse { .. } => MessageKind::ViewResponse,
            ReplicationPayload::TransferRequest { .. } => MessageKind::TransferRequest,
            ReplicationPayload::TransferResult { .. } => MessageKind::TransferResult,
            ReplicationPayload::ChangeNotification => MessageKind::ChangeNotification,
        }
    }

    /// Sequence number of requests and replies.
    pub fn sequence(&self) -> Option<u64> {
        match self.payload {
            ReplicationPayload::ViewRequest { sequence, .. }
            | ReplicationPayload::ViewResponse { sequence, .. }
            | ReplicationPayload::TransferRequest { sequence, .. }
            | ReplicationPayload::TransferResult { sequence, .. } => Some(sequence),
            ReplicationPayload::ChangeNotification => None,
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(
            self.kind(),
            MessageKind::ViewRequest | MessageKind::TransferRequest
        )
    }

    /// Encode for a byte-oriented transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransportError> {
        bincode::serialize(self).map_err(|e| TransportError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        bincode::deserialize(bytes).map_err(|e| TransportError::Serialization(e.to_string()))
    }
}
