//! # Replication Flows
//!
//! Peers never touch storage directly:
//!
//! 1. **View**: `ViewRequest` → host filters and pages → `ViewResponse`
//! 2. **Transfer**: `TransferRequest` → host merges → `TransferResult`
//! 3. **Refresh**: every committed mutation broadcasts `ChangeNotification`,
//!    and every viewer of that unit re-requests its page

#[cfg(test)]
mod tests {
    use super::super::harness::{fish, ore, settle, unit, wood, HostNode, PeerNode, HOST};
    use singularity_bus::{EnvelopePublisher, InMemoryPeerBus, PeerEnvelope};
    use singularity_storage::adapters::InMemoryUnitStore;
    use singularity_storage::{
        HandleOutcome, ItemGroup, ItemQuery, LocationContext, MaterialSourceProvider, PeerId,
        PollOutcome, ReplicationMessage, ReplicationPayload, Role, SessionEvent, StackKey,
        StorageApi, StorageConfig, Target,
    };
    use std::time::Duration;
    use tokio::time::timeout;

    fn host(bus: &InMemoryPeerBus, config: StorageConfig) -> HostNode<InMemoryUnitStore> {
        HostNode::new(bus, InMemoryUnitStore::new(), config, Role::Authoritative)
    }

    // =============================================================================
    // VIEW
    // =============================================================================

    #[test]
    fn test_peer_sees_host_contents() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        host.storage
            .add(&chest, &StackKey::from("(O)388"), 50, &wood())
            .unwrap();

        let mut peer = PeerNode::join(&bus, PeerId(1), chest);
        peer.session.open().unwrap();
        assert!(peer.session.is_loading());

        let events = settle(&mut host, &mut [&mut peer]);

        assert_eq!(events[0], vec![SessionEvent::ViewUpdated]);
        assert!(!peer.session.is_loading());
        let view = peer.session.view().expect("view");
        assert_eq!((view.used, view.capacity), (1, 36));
        assert_eq!(view.page.total_count, 1);
        assert_eq!(view.page.items[0].quantity, 50);
    }

    #[test]
    fn test_filtering_and_paging_happen_on_host() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default().with_default_capacity(100));
        let chest = unit("chest");
        for n in 0..30 {
            host.storage
                .add(&chest, &StackKey::new(format!("(O)fish{n}")), 1, &fish(n))
                .unwrap();
        }
        for n in 0..10 {
            host.storage
                .add(&chest, &StackKey::new(format!("(O)ore{n}")), 5, &ore(n))
                .unwrap();
        }

        let mut peer = PeerNode::join(&bus, PeerId(1), chest).with_page_size(12);
        peer.session
            .set_query(ItemQuery::new().with_group(ItemGroup::Fishing))
            .unwrap();
        settle(&mut host, &mut [&mut peer]);

        let view = peer.session.view().unwrap();
        assert_eq!(view.page.total_count, 30);
        assert_eq!(view.page.total_pages, 3);
        assert_eq!(view.page.items.len(), 12);
        assert_eq!(view.used, 40);

        peer.session.next_page().unwrap().unwrap();
        settle(&mut host, &mut [&mut peer]);
        peer.session.next_page().unwrap().unwrap();
        settle(&mut host, &mut [&mut peer]);
        assert_eq!(peer.session.page_index(), 2);
        assert_eq!(peer.session.view().unwrap().page.items.len(), 6);
        assert!(peer.session.next_page().is_none());

        peer.session
            .set_query(ItemQuery::new().with_group(ItemGroup::Fishing).with_search("fish 2"))
            .unwrap();
        settle(&mut host, &mut [&mut peer]);
        assert_eq!(peer.session.page_index(), 0);
        assert_eq!(peer.session.view().unwrap().page.total_count, 11);

        peer.session
            .set_query(ItemQuery::new().with_sub_class(-15))
            .unwrap();
        settle(&mut host, &mut [&mut peer]);
        assert_eq!(peer.session.view().unwrap().page.total_count, 10);
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        host.storage
            .add(&chest, &StackKey::from("(O)388"), 10, &wood())
            .unwrap();

        let mut peer = PeerNode::join(&bus, PeerId(1), chest);
        peer.session.set_page(9).unwrap();
        settle(&mut host, &mut [&mut peer]);

        assert_eq!(peer.session.page_index(), 0);
        assert_eq!(peer.session.view().unwrap().page.items.len(), 1);
    }

    #[test]
    fn test_stale_view_response_is_ignored() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        host.storage
            .add(&chest, &StackKey::from("(O)388"), 10, &wood())
            .unwrap();
        host.storage
            .add(&chest, &StackKey::from("(O)fish"), 1, &fish(0))
            .unwrap();

        let mut peer = PeerNode::join(&bus, PeerId(1), chest);
        peer.session.open().unwrap();
        peer.session
            .set_query(ItemQuery::new().with_group(ItemGroup::Fishing))
            .unwrap();

        assert_eq!(
            host.pump(),
            vec![HandleOutcome::Replied, HandleOutcome::Replied]
        );
        assert_eq!(
            peer.pump(),
            vec![SessionEvent::Ignored, SessionEvent::ViewUpdated]
        );
        assert_eq!(peer.session.view().unwrap().page.total_count, 1);
        assert_eq!(
            peer.session.view().unwrap().page.items[0].display_name(),
            "Fish 0"
        );
    }

    // =============================================================================
    // TRANSFERS AND REFRESH
    // =============================================================================

    #[test]
    fn test_deposit_refreshes_every_viewer() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        host.storage
            .add(&chest, &StackKey::from("(O)388"), 50, &wood())
            .unwrap();

        let mut alice = PeerNode::join(&bus, PeerId(1), chest.clone());
        let mut bob = PeerNode::join(&bus, PeerId(2), chest.clone());
        alice.session.open().unwrap();
        bob.session.open().unwrap();
        settle(&mut host, &mut [&mut alice, &mut bob]);

        let sequence = alice
            .session
            .deposit(StackKey::from("(O)388"), 20, wood())
            .unwrap();
        assert_eq!(alice.session.pending_transfers(), 1);

        assert_eq!(host.pump(), vec![HandleOutcome::Replied]);
        assert_eq!(
            alice.pump(),
            vec![
                SessionEvent::RefreshRequested,
                SessionEvent::TransferCompleted {
                    sequence,
                    moved: 20,
                    remainder: 0,
                },
            ]
        );
        assert_eq!(bob.pump(), vec![SessionEvent::RefreshRequested]);

        settle(&mut host, &mut [&mut alice, &mut bob]);

        for peer in [&alice, &bob] {
            let view = peer.session.view().unwrap();
            assert_eq!(view.page.items.len(), 1);
            assert_eq!(view.page.items[0].quantity, 70);
        }
        assert_eq!(alice.session.pending_transfers(), 0);
    }

    #[test]
    fn test_lost_transfer_result_expires_and_view_reconciles() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        host.storage
            .add(&chest, &StackKey::from("(O)388"), 50, &wood())
            .unwrap();

        let mut peer = PeerNode::join(&bus, PeerId(1), chest);
        peer.session.open().unwrap();
        settle(&mut host, &mut [&mut peer]);

        let sequence = peer
            .session
            .deposit(StackKey::from("(O)388"), 20, wood())
            .unwrap();
        assert_eq!(host.pump(), vec![HandleOutcome::Replied]);
        assert_eq!(peer.discard_pending(), 2);

        peer.clock.advance(1999);
        assert_eq!(peer.session.poll(), PollOutcome::Idle);
        assert_eq!(peer.session.pending_transfers(), 1);

        peer.clock.advance(1);
        assert_eq!(
            peer.session.poll(),
            PollOutcome::TransferExpired { sequence }
        );
        assert_eq!(peer.session.pending_transfers(), 0);
        assert_eq!(peer.session.view().unwrap().page.items[0].quantity, 50);

        peer.session.refresh().unwrap();
        settle(&mut host, &mut [&mut peer]);
        assert_eq!(peer.session.view().unwrap().page.items[0].quantity, 70);
    }

    #[test]
    fn test_deposit_into_full_unit_reports_remainder() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default().with_default_capacity(1));
        let chest = unit("chest");
        host.storage.get(&chest).unwrap();

        let mut peer = PeerNode::join(&bus, PeerId(1), chest.clone());
        let sequence = peer
            .session
            .deposit(StackKey::from("(O)388"), 1200, wood())
            .unwrap();
        let events = settle(&mut host, &mut [&mut peer]);

        assert!(events[0].contains(&SessionEvent::TransferCompleted {
            sequence,
            moved: 999,
            remainder: 201,
        }));
        assert_eq!(host.storage.counts(&chest).unwrap(), (1, 1));
    }

    #[test]
    fn test_withdraw_by_record() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        host.storage
            .add(&chest, &StackKey::from("(O)388"), 50, &wood())
            .unwrap();

        let mut peer = PeerNode::join(&bus, PeerId(1), chest.clone());
        peer.session.open().unwrap();
        settle(&mut host, &mut [&mut peer]);

        let record = peer.session.view().unwrap().page.items[0].record;
        peer.session
            .withdraw(StackKey::from("(O)388"), record, 30)
            .unwrap();
        let events = settle(&mut host, &mut [&mut peer]);

        assert!(events[0]
            .iter()
            .any(|e| matches!(e, SessionEvent::TransferCompleted { moved: 30, .. })));
        assert_eq!(peer.session.view().unwrap().page.items[0].quantity, 20);
        assert_eq!(
            host.storage
                .get(&chest)
                .unwrap()
                .items
                .iter()
                .map(|i| i.quantity)
                .sum::<u32>(),
            20
        );
    }

    #[test]
    fn test_viewer_of_other_unit_not_refreshed() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        let fridge = unit("fridge");
        host.storage.get(&chest).unwrap();
        host.storage.get(&fridge).unwrap();

        let mut writer = PeerNode::join(&bus, PeerId(1), chest);
        let mut watcher = PeerNode::join(&bus, PeerId(2), fridge);
        watcher.session.open().unwrap();
        settle(&mut host, &mut [&mut writer, &mut watcher]);

        writer
            .session
            .deposit(StackKey::from("(O)388"), 5, wood())
            .unwrap();
        let events = settle(&mut host, &mut [&mut writer, &mut watcher]);

        assert_eq!(events[1], vec![SessionEvent::Ignored]);
        assert_eq!(watcher.session.view().unwrap().page.total_count, 0);
    }

    // =============================================================================
    // ROLES AND RETRIES
    // =============================================================================

    #[test]
    fn test_replica_host_never_answers() {
        let bus = InMemoryPeerBus::new();
        let mut replica =
            HostNode::new(&bus, InMemoryUnitStore::new(), StorageConfig::default(), Role::Replica);
        let mut peer = PeerNode::join(&bus, PeerId(1), unit("chest"));

        peer.session.open().unwrap();
        assert_eq!(replica.pump(), vec![HandleOutcome::Ignored]);
        assert_eq!(replica.storage.cached_count(), 0);

        assert_eq!(peer.session.poll(), PollOutcome::Waiting);
        for expected in 2..=4 {
            peer.clock.advance(2000);
            assert_eq!(
                peer.session.poll(),
                PollOutcome::Retried { sequence: expected }
            );
            assert_eq!(replica.pump(), vec![HandleOutcome::Ignored]);
        }
        peer.clock.advance(2000);
        assert_eq!(peer.session.poll(), PollOutcome::GaveUp);
        assert!(!peer.session.is_loading());
        assert!(peer.session.view().is_none());
    }

    #[test]
    fn test_unplaced_unit_is_never_served() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let mut peer = PeerNode::join(&bus, PeerId(1), unit("nowhere"));

        peer.session.open().unwrap();
        peer.session
            .deposit(StackKey::from("(O)388"), 5, wood())
            .unwrap();

        assert_eq!(
            host.pump(),
            vec![HandleOutcome::Ignored, HandleOutcome::Ignored]
        );
        assert_eq!(host.storage.cached_count(), 0);
        assert!(peer.pump().is_empty());
        assert!(peer.session.is_loading());
    }

    #[test]
    fn test_lost_request_recovered_by_retry() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        host.storage
            .add(&chest, &StackKey::from("(O)388"), 10, &wood())
            .unwrap();

        let mut peer = PeerNode::join(&bus, PeerId(1), chest);
        peer.session.open().unwrap();
        assert_eq!(host.discard_pending(), 1);

        peer.clock.advance(1999);
        assert_eq!(peer.session.poll(), PollOutcome::Waiting);
        peer.clock.advance(1);
        assert_eq!(peer.session.poll(), PollOutcome::Retried { sequence: 2 });

        let events = settle(&mut host, &mut [&mut peer]);
        assert_eq!(events[0], vec![SessionEvent::ViewUpdated]);
        assert_eq!(peer.session.poll(), PollOutcome::Idle);
    }

    #[tokio::test]
    async fn test_host_task_serves_peer() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        host.storage
            .add(&chest, &StackKey::from("(O)388"), 10, &wood())
            .unwrap();
        let mut peer = PeerNode::join(&bus, PeerId(1), chest);

        let server = tokio::spawn(async move { host.serve_one().await });
        peer.session.open().unwrap();

        let outcome = timeout(Duration::from_millis(500), server)
            .await
            .expect("timeout waiting for host")
            .expect("host task panicked");
        assert_eq!(outcome, Some(HandleOutcome::Replied));

        let event = timeout(Duration::from_millis(100), peer.receive_one())
            .await
            .expect("timeout waiting for response")
            .expect("bus closed");
        assert_eq!(event, SessionEvent::ViewUpdated);
        assert_eq!(peer.session.view().unwrap().page.items[0].quantity, 10);
    }

    #[tokio::test]
    async fn test_host_task_drains_envelope_stream() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let chest = unit("chest");
        host.storage
            .add(&chest, &StackKey::from("(O)388"), 10, &wood())
            .unwrap();
        let requests = bus.stream(HOST);
        let mut peer = PeerNode::join(&bus, PeerId(1), chest.clone());
        let mut tool = bus.subscribe(PeerId(9));

        let server = tokio::spawn(host.serve_stream(requests, 2));
        peer.session.open().unwrap();
        let receivers = bus
            .publish(PeerEnvelope::new(
                PeerId(9),
                Target::Peer(HOST),
                ReplicationMessage::new(
                    chest,
                    ReplicationPayload::ViewRequest {
                        sequence: 41,
                        page_index: 0,
                        page_size: 0,
                        query: ItemQuery::new(),
                    },
                ),
            ))
            .await;
        assert!(receivers > 0);

        let outcomes = timeout(Duration::from_millis(500), server)
            .await
            .expect("timeout waiting for host")
            .expect("host task panicked");
        assert_eq!(outcomes, vec![HandleOutcome::Replied, HandleOutcome::Replied]);

        let event = timeout(Duration::from_millis(100), peer.receive_one())
            .await
            .expect("timeout waiting for peer reply")
            .expect("bus closed");
        assert_eq!(event, SessionEvent::ViewUpdated);

        let reply = timeout(Duration::from_millis(100), tool.recv())
            .await
            .expect("timeout waiting for tool reply")
            .expect("bus closed");
        match reply.message.payload {
            ReplicationPayload::ViewResponse { sequence, page, .. } => {
                assert_eq!(sequence, 41);
                assert_eq!(page.items[0].quantity, 10);
            }
            other => panic!("Expected ViewResponse, got {other:?}"),
        }
    }

    // =============================================================================
    // CRAFTING SOURCES
    // =============================================================================

    #[test]
    fn test_material_sources_for_location() {
        let bus = InMemoryPeerBus::new();
        let mut host = host(&bus, StorageConfig::default());
        let shed = unit("shed");
        let barn = unit("barn");
        host.storage
            .add(&shed, &StackKey::from("(O)388"), 40, &wood())
            .unwrap();
        host.storage
            .add(&barn, &StackKey::from("(O)ore"), 3, &ore(0))
            .unwrap();

        let location = LocationContext::new("Farm")
            .with_unit(shed.clone())
            .with_unit(barn.clone());
        let sources = host.storage.list_material_sources(&location);

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id, shed);
        assert_eq!(sources[0].items[0].quantity, 40);
        assert_eq!(sources[1].id, barn);
    }
}
