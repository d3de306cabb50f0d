//! # Test Harness
//!
//! A host node owns the storage service and answers its inbox; peer nodes
//! drive a `PeerSession` each. `settle` pumps every inbox until the bus is
//! quiet.

use singularity_bus::{EnvelopeStream, InMemoryPeerBus, PeerEndpoint, Subscription};
use singularity_storage::adapters::{BroadcastNotifier, JsonItemCodec, ManualTimeSource};
use singularity_storage::{
    ClassificationRegistry, HandleOutcome, HostHandler, ItemAttributes, PeerId, PeerSession,
    ReplicationConfig, Role, SessionEvent, StorageConfig, StorageDependencies, StorageService,
    UnitId, UnitStore,
};
use tokio_stream::StreamExt;

pub const HOST: PeerId = PeerId(0);

/// Upper bound on pump rounds before `settle` declares a livelock.
const MAX_SETTLE_ROUNDS: usize = 32;

pub type HostStorage<S> = StorageService<S, JsonItemCodec, BroadcastNotifier<PeerEndpoint>>;

pub struct HostNode<S: UnitStore> {
    pub storage: HostStorage<S>,
    pub handler: HostHandler<PeerEndpoint>,
    inbox: Subscription,
}

impl<S: UnitStore> HostNode<S> {
    pub fn new(bus: &InMemoryPeerBus, store: S, config: StorageConfig, role: Role) -> Self {
        let inbox = bus.subscribe(HOST);
        let storage = StorageService::new(
            StorageDependencies {
                store,
                codec: JsonItemCodec,
                observer: BroadcastNotifier::new(bus.endpoint(HOST)),
                registry: ClassificationRegistry::standard(),
            },
            config,
        );
        Self {
            storage,
            handler: HostHandler::new(role, bus.endpoint(HOST)),
            inbox,
        }
    }

    /// Handle everything waiting in the inbox.
    pub fn pump(&mut self) -> Vec<HandleOutcome> {
        let mut outcomes = Vec::new();
        for envelope in self.inbox.drain() {
            outcomes.push(
                self.handler
                    .handle(&mut self.storage, envelope.from, envelope.message),
            );
        }
        outcomes
    }

    /// Drop everything waiting, as if the network lost it.
    pub fn discard_pending(&mut self) -> usize {
        self.inbox.drain().len()
    }

    /// Wait for one envelope and handle it.
    pub async fn serve_one(&mut self) -> Option<HandleOutcome> {
        let envelope = self.inbox.recv().await?;
        Some(
            self.handler
                .handle(&mut self.storage, envelope.from, envelope.message),
        )
    }

    /// Serve `count` envelopes from a stream, then hand back the outcomes.
    pub async fn serve_stream(
        mut self,
        mut requests: EnvelopeStream,
        count: usize,
    ) -> Vec<HandleOutcome> {
        let mut outcomes = Vec::with_capacity(count);
        while outcomes.len() < count {
            let Some(envelope) = requests.next().await else {
                break;
            };
            outcomes.push(
                self.handler
                    .handle(&mut self.storage, envelope.from, envelope.message),
            );
        }
        outcomes
    }
}

pub struct PeerNode {
    pub session: PeerSession<PeerEndpoint, ManualTimeSource>,
    pub clock: ManualTimeSource,
    inbox: Subscription,
}

impl PeerNode {
    pub fn join(bus: &InMemoryPeerBus, id: PeerId, unit: UnitId) -> Self {
        Self::join_with(bus, id, unit, ReplicationConfig::default())
    }

    pub fn join_with(
        bus: &InMemoryPeerBus,
        id: PeerId,
        unit: UnitId,
        config: ReplicationConfig,
    ) -> Self {
        let inbox = bus.subscribe(id);
        let clock = ManualTimeSource::new(0);
        let session = PeerSession::new(unit, HOST, bus.endpoint(id), clock.clone(), config);
        Self {
            session,
            clock,
            inbox,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.session = self.session.with_page_size(page_size);
        self
    }

    /// Feed everything waiting to the session.
    pub fn pump(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for envelope in self.inbox.drain() {
            events.push(self.session.handle(envelope.message));
        }
        events
    }

    /// Drop everything waiting, as if the network lost it.
    pub fn discard_pending(&mut self) -> usize {
        self.inbox.drain().len()
    }

    /// Wait for one envelope and feed it to the session.
    pub async fn receive_one(&mut self) -> Option<SessionEvent> {
        let envelope = self.inbox.recv().await?;
        Some(self.session.handle(envelope.message))
    }
}

/// Pump host and peers until a full round moves nothing.
///
/// Returns every peer event seen, per peer, in order.
pub fn settle<S: UnitStore>(
    host: &mut HostNode<S>,
    peers: &mut [&mut PeerNode],
) -> Vec<Vec<SessionEvent>> {
    let mut seen = vec![Vec::new(); peers.len()];
    for _ in 0..MAX_SETTLE_ROUNDS {
        let mut moved = host.pump().len();
        for (peer, events) in peers.iter_mut().zip(seen.iter_mut()) {
            let batch = peer.pump();
            moved += batch.len();
            events.extend(batch);
        }
        if moved == 0 {
            return seen;
        }
    }
    panic!("bus did not settle after {MAX_SETTLE_ROUNDS} rounds");
}

pub fn unit(id: &str) -> UnitId {
    UnitId::new(id).unwrap()
}

pub fn wood() -> ItemAttributes {
    ItemAttributes::new("Wood", -16, 999)
}

pub fn fish(n: usize) -> ItemAttributes {
    ItemAttributes::new(format!("Fish {n}"), -4, 1)
}

pub fn ore(n: usize) -> ItemAttributes {
    ItemAttributes::new(format!("Ore {n}"), -15, 999)
}
