//! # Authoritative Handler
//!
//! Answers peer requests from the live units of the local storage
//! service. Keeps no per-requester state between requests.
//!
//! Only units the host already holds (cached or persisted) are served.
//! Requests naming any other id are dropped, so peers cannot make the host
//! create units. The host brings a unit into play with `StorageApi::get`.
//!
//! Change notifications are not sent from here: the storage service's
//! observer (`BroadcastNotifier`) emits them after every committed
//! mutation, whoever caused it.

use crate::domain::entities::UnitId;
use crate::domain::errors::StorageError;
use crate::domain::query::{ItemQuery, QueryPage};
use crate::ipc::messages::{PeerId, ReplicationMessage, ReplicationPayload, Target, TransferOp};
use crate::ports::inbound::StorageApi;
use crate::ports::outbound::Transport;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Whether this process owns the units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Authoritative,
    Replica,
}

/// What the handler did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// A reply went back to the sender.
    Replied,
    /// Dropped: wrong role, wrong kind, or unknown unit.
    Ignored,
    /// The request ran but the reply could not be sent.
    Failed(StorageError),
}

pub struct HostHandler<T: Transport> {
    role: Role,
    transport: T,
}

impl<T: Transport> HostHandler<T> {
    pub fn new(role: Role, transport: T) -> Self {
        Self { role, transport }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn handle<A: StorageApi>(
        &self,
        storage: &mut A,
        from: PeerId,
        message: ReplicationMessage,
    ) -> HandleOutcome {
        if self.role != Role::Authoritative {
            debug!(peer = %from, kind = %message.kind(), "Replica dropped replication message");
            return HandleOutcome::Ignored;
        }

        let kind = message.kind();
        let unit = message.unit_id.clone();
        if message.is_request() && !storage.contains(&unit) {
            debug!(peer = %from, unit = %unit, kind = %kind, "Request for unknown unit");
            return HandleOutcome::Ignored;
        }

        let reply = match message.payload {
            ReplicationPayload::ViewRequest {
                sequence,
                page_index,
                page_size,
                query,
            } => view(storage, &unit, page_index, page_size, &query).map(|(page, used, capacity)| {
                ReplicationPayload::ViewResponse {
                    sequence,
                    page,
                    used,
                    capacity,
                }
            }),
            ReplicationPayload::TransferRequest { sequence, op } => {
                transfer(storage, &unit, op).map(|(moved, remainder)| {
                    ReplicationPayload::TransferResult {
                        sequence,
                        moved,
                        remainder,
                    }
                })
            }
            _ => {
                debug!(peer = %from, unit = %unit, kind = %kind, "Unexpected message kind on host");
                return HandleOutcome::Ignored;
            }
        };

        let payload = match reply {
            Ok(payload) => payload,
            Err(e) => {
                debug!(peer = %from, unit = %unit, error = %e, "Request rejected");
                return HandleOutcome::Ignored;
            }
        };

        match self
            .transport
            .send(ReplicationMessage::new(unit, payload), Target::Peer(from))
        {
            Ok(()) => HandleOutcome::Replied,
            Err(e) => HandleOutcome::Failed(e.into()),
        }
    }
}

fn view<A: StorageApi>(
    storage: &mut A,
    unit: &UnitId,
    page_index: usize,
    page_size: usize,
    query: &ItemQuery,
) -> Result<(QueryPage, u32, u32), StorageError> {
    let page = storage.query(unit, query, page_index, page_size)?;
    let (used, capacity) = storage.counts(unit)?;
    Ok((page, used, capacity))
}

fn transfer<A: StorageApi>(
    storage: &mut A,
    unit: &UnitId,
    op: TransferOp,
) -> Result<(u32, u32), StorageError> {
    match op {
        TransferOp::Deposit {
            key,
            quantity,
            attributes,
        } => {
            let result = storage.add(unit, &key, quantity, &attributes)?;
            Ok((result.accepted, result.remainder))
        }
        TransferOp::Withdraw { key, record, amount } => {
            let removed = storage.remove(unit, &key, record, amount)?;
            Ok((removed, 0))
        }
    }
}
