//! # Peer Session
//!
//! Viewing session of a non-authoritative process on one remote unit.
//!
//! ```text
//! Idle ──open / filter / page / refresh──→ AwaitingResponse{seq}
//! AwaitingResponse ──ViewResponse{seq}──→ Idle (page shown)
//! AwaitingResponse ──timeout──→ AwaitingResponse{seq'} (re-sent)
//! AwaitingResponse ──retries spent──→ Idle (last page kept)
//! ```
//!
//! Only a response echoing the latest sequence is applied. Transfers are
//! forwarded as-is; the session never edits its cached page locally.
//!
//! Transfers are never re-sent: a deposit or withdrawal is not idempotent.
//! One left unanswered for `response_timeout` is expired by `poll` and
//! reported, and a result arriving after that is ignored.

use crate::domain::config::ReplicationConfig;
use crate::domain::entities::{ItemAttributes, RecordId, StackKey, UnitId};
use crate::domain::errors::TransportError;
use crate::domain::query::{ItemQuery, QueryPage, DEFAULT_PAGE_SIZE};
use crate::ipc::messages::{PeerId, ReplicationMessage, ReplicationPayload, Target, TransferOp};
use crate::ports::outbound::{TimeSource, Transport};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse {
        sequence: u64,
        /// Send time of the current attempt, in `TimeSource` millis.
        sent_at: u64,
        /// Re-sends so far.
        attempts: u32,
    },
}

/// Last page received from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerView {
    pub page: QueryPage,
    pub used: u32,
    pub capacity: u32,
}

/// Result of feeding a message to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Wrong unit, stale sequence, or a kind peers do not accept.
    Ignored,
    ViewUpdated,
    TransferCompleted {
        sequence: u64,
        moved: u32,
        remainder: u32,
    },
    /// A change notification triggered a new view request.
    RefreshRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Idle,
    Waiting,
    Retried { sequence: u64 },
    /// Retry budget spent; the session is idle again.
    GaveUp,
    /// No result for this transfer within the timeout. Its outcome is
    /// unknown until the next view of the unit.
    TransferExpired { sequence: u64 },
}

pub struct PeerSession<T: Transport, TS: TimeSource> {
    unit: UnitId,
    host: PeerId,
    transport: T,
    clock: TS,
    config: ReplicationConfig,
    query: ItemQuery,
    page_index: usize,
    page_size: usize,
    state: SessionState,
    next_sequence: u64,
    /// Sequence to send time.
    pending_transfers: BTreeMap<u64, u64>,
    view: Option<PeerView>,
}

impl<T: Transport, TS: TimeSource> PeerSession<T, TS> {
    pub fn new(unit: UnitId, host: PeerId, transport: T, clock: TS, config: ReplicationConfig) -> Self {
        Self {
            unit,
            host,
            transport,
            clock,
            config,
            query: ItemQuery::default(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            state: SessionState::Idle,
            next_sequence: 1,
            pending_transfers: BTreeMap::new(),
            view: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        self
    }

    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The "loading" indicator.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::AwaitingResponse { .. })
    }

    pub fn view(&self) -> Option<&PeerView> {
        self.view.as_ref()
    }

    pub fn query(&self) -> &ItemQuery {
        &self.query
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn pending_transfers(&self) -> usize {
        self.pending_transfers.len()
    }

    /// Request the first view.
    pub fn open(&mut self) -> Result<u64, TransportError> {
        self.request_view()
    }

    /// Change filters. Resets to the first page.
    pub fn set_query(&mut self, query: ItemQuery) -> Result<u64, TransportError> {
        self.query = query;
        self.page_index = 0;
        self.request_view()
    }

    pub fn set_page(&mut self, page_index: usize) -> Result<u64, TransportError> {
        self.page_index = page_index;
        self.request_view()
    }

    /// `None` when already on the last known page.
    pub fn next_page(&mut self) -> Option<Result<u64, TransportError>> {
        let total = self.view.as_ref().map_or(1, |v| v.page.total_pages);
        (self.page_index + 1 < total).then(|| self.set_page(self.page_index + 1))
    }

    /// `None` when already on the first page.
    pub fn prev_page(&mut self) -> Option<Result<u64, TransportError>> {
        (self.page_index > 0).then(|| self.set_page(self.page_index - 1))
    }

    pub fn refresh(&mut self) -> Result<u64, TransportError> {
        self.request_view()
    }

    /// Forward a deposit to the host.
    pub fn deposit(
        &mut self,
        key: StackKey,
        quantity: u32,
        attributes: ItemAttributes,
    ) -> Result<u64, TransportError> {
        self.send_transfer(TransferOp::Deposit {
            key,
            quantity,
            attributes,
        })
    }

    /// Forward a withdrawal to the host.
    pub fn withdraw(
        &mut self,
        key: StackKey,
        record: RecordId,
        amount: u32,
    ) -> Result<u64, TransportError> {
        self.send_transfer(TransferOp::Withdraw { key, record, amount })
    }

    /// Feed a message received from the host.
    pub fn handle(&mut self, message: ReplicationMessage) -> SessionEvent {
        if message.unit_id != self.unit {
            debug!(unit = %self.unit, other = %message.unit_id, "Message for another unit");
            return SessionEvent::Ignored;
        }

        match message.payload {
            ReplicationPayload::ViewResponse {
                sequence,
                page,
                used,
                capacity,
            } => {
                if self.awaited_sequence() != Some(sequence) {
                    debug!(unit = %self.unit, sequence, "Stale view response");
                    return SessionEvent::Ignored;
                }
                self.page_index = page.page_index;
                self.view = Some(PeerView {
                    page,
                    used,
                    capacity,
                });
                self.state = SessionState::Idle;
                SessionEvent::ViewUpdated
            }
            ReplicationPayload::TransferResult {
                sequence,
                moved,
                remainder,
            } => {
                if self.pending_transfers.remove(&sequence).is_some() {
                    SessionEvent::TransferCompleted {
                        sequence,
                        moved,
                        remainder,
                    }
                } else {
                    debug!(unit = %self.unit, sequence, "Unknown transfer result");
                    SessionEvent::Ignored
                }
            }
            ReplicationPayload::ChangeNotification => {
                if let Err(e) = self.refresh() {
                    debug!(unit = %self.unit, error = %e, "Refresh send failed, will retry");
                }
                SessionEvent::RefreshRequested
            }
            ReplicationPayload::ViewRequest { .. } | ReplicationPayload::TransferRequest { .. } => {
                debug!(unit = %self.unit, "Peer dropped request");
                SessionEvent::Ignored
            }
        }
    }

    /// Drive timeouts using the session clock.
    pub fn poll(&mut self) -> PollOutcome {
        let now = self.clock.now();
        self.poll_at(now)
    }

    /// Drive timeouts at an explicit instant.
    ///
    /// Expired transfers are reported first, oldest first, one per call.
    /// Keep polling until the outcome is `Idle` or `Waiting`.
    pub fn poll_at(&mut self, now: u64) -> PollOutcome {
        if let Some(sequence) = self.expire_transfer(now) {
            return PollOutcome::TransferExpired { sequence };
        }

        let SessionState::AwaitingResponse {
            sent_at, attempts, ..
        } = self.state
        else {
            return PollOutcome::Idle;
        };

        if now.saturating_sub(sent_at) < self.config.timeout_millis() {
            return PollOutcome::Waiting;
        }

        if attempts >= self.config.max_retries {
            warn!(unit = %self.unit, attempts, "No view response, giving up");
            self.state = SessionState::Idle;
            return PollOutcome::GaveUp;
        }

        let (sequence, sent) = self.dispatch_view(now, attempts + 1);
        match sent {
            Ok(()) => debug!(unit = %self.unit, sequence, attempt = attempts + 1, "Re-sent view request"),
            Err(e) => debug!(unit = %self.unit, error = %e, "View request send failed"),
        }
        PollOutcome::Retried { sequence }
    }

    fn request_view(&mut self) -> Result<u64, TransportError> {
        let now = self.clock.now();
        let (sequence, sent) = self.dispatch_view(now, 0);
        sent.map(|()| sequence)
    }

    /// Send a fresh view request. The session is left awaiting even when
    /// the send fails, so `poll` re-sends it.
    fn dispatch_view(&mut self, now: u64, attempts: u32) -> (u64, Result<(), TransportError>) {
        let sequence = self.allocate_sequence();
        self.state = SessionState::AwaitingResponse {
            sequence,
            sent_at: now,
            attempts,
        };
        let sent = self
            .transport
            .send(self.view_request(sequence), Target::Peer(self.host));
        (sequence, sent)
    }

    fn view_request(&self, sequence: u64) -> ReplicationMessage {
        ReplicationMessage::new(
            self.unit.clone(),
            ReplicationPayload::ViewRequest {
                sequence,
                page_index: self.page_index,
                page_size: self.page_size,
                query: self.query.clone(),
            },
        )
    }

    fn send_transfer(&mut self, op: TransferOp) -> Result<u64, TransportError> {
        let sequence = self.allocate_sequence();
        let message = ReplicationMessage::new(
            self.unit.clone(),
            ReplicationPayload::TransferRequest { sequence, op },
        );
        self.transport.send(message, Target::Peer(self.host))?;
        self.pending_transfers.insert(sequence, self.clock.now());
        Ok(sequence)
    }

    fn expire_transfer(&mut self, now: u64) -> Option<u64> {
        let timeout = self.config.timeout_millis();
        let sequence = self
            .pending_transfers
            .iter()
            .find(|(_, sent_at)| now.saturating_sub(**sent_at) >= timeout)
            .map(|(sequence, _)| *sequence)?;

        self.pending_transfers.remove(&sequence);
        warn!(unit = %self.unit, sequence, "No transfer result, expiring");
        Some(sequence)
    }

    fn awaited_sequence(&self) -> Option<u64> {
        match self.state {
            SessionState::AwaitingResponse { sequence, .. } => Some(sequence),
            SessionState::Idle => None,
        }
    }

    fn allocate_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}
