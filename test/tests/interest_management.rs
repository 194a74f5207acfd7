/// Observer rebuilds driven by the interest management, end to end

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use tern_server::{PredicateInterest, ServerEvent, Visibility};
use tern_shared::{Channel, ConnectionId, NetworkId, ReadyMessage};
use tern_test::{batch_of, packed, Harness};

type VisiblePairs = Rc<RefCell<HashSet<(NetworkId, ConnectionId)>>>;

fn harness_with_pairs() -> (Harness, VisiblePairs) {
    let pairs: VisiblePairs = Rc::new(RefCell::new(HashSet::new()));
    let mut harness = Harness::new();
    let predicate_pairs = pairs.clone();
    harness
        .server
        .set_interest_management(PredicateInterest::new(
            move |entity: NetworkId, connection: ConnectionId| {
                predicate_pairs.borrow().contains(&(entity, connection))
            },
        ));
    (harness, pairs)
}

fn spawned(events: &[ServerEvent]) -> Vec<(ConnectionId, NetworkId)> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::Spawn { connection, entity } => Some((*connection, *entity)),
            _ => None,
        })
        .collect()
}

fn despawned(events: &[ServerEvent]) -> Vec<(ConnectionId, NetworkId)> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::Despawn { connection, entity } => Some((*connection, *entity)),
            _ => None,
        })
        .collect()
}

#[test]
fn spawn_goes_to_interested_ready_clients() {
    let (mut harness, pairs) = harness_with_pairs();
    let a = harness.add_client();
    let b = harness.add_client();
    harness.connect_all_ready();
    let (a, b) = (harness.client_id(a), harness.client_id(b));
    harness.server.take_events();

    pairs.borrow_mut().insert((NetworkId(1), b));
    harness.server.spawn(NetworkId(1), None).unwrap();

    assert_eq!(spawned(&harness.server.take_events()), vec![(b, NetworkId(1))]);
    assert!(!harness.server.observers(&NetworkId(1)).unwrap().contains(&a));
}

#[test]
fn periodic_rebuild_follows_the_predicate() {
    let (mut harness, pairs) = harness_with_pairs();
    let a = harness.add_client();
    harness.connect_all_ready();
    let a = harness.client_id(a);
    harness.server.spawn(NetworkId(4), None).unwrap();
    harness.server.take_events();

    pairs.borrow_mut().insert((NetworkId(4), a));
    // the default rebuild interval is one second
    harness.run(70);
    assert_eq!(spawned(&harness.server.take_events()), vec![(a, NetworkId(4))]);

    pairs.borrow_mut().clear();
    harness.run(70);
    assert_eq!(
        despawned(&harness.server.take_events()),
        vec![(a, NetworkId(4))]
    );
}

#[test]
fn visibility_overrides_the_predicate() {
    let (mut harness, _pairs) = harness_with_pairs();
    let a = harness.add_client();
    let b = harness.add_client();
    harness.connect_all_ready();
    let (a, b) = (harness.client_id(a), harness.client_id(b));

    harness.server.spawn(NetworkId(2), Some(a)).unwrap();
    harness
        .server
        .set_visibility(&NetworkId(2), Visibility::ForceShown)
        .unwrap();
    let mut observers: Vec<ConnectionId> = harness
        .server
        .observers(&NetworkId(2))
        .unwrap()
        .iter()
        .copied()
        .collect();
    observers.sort();
    assert_eq!(observers, vec![a, b]);

    harness
        .server
        .set_visibility(&NetworkId(2), Visibility::ForceHidden)
        .unwrap();
    // the owner stays
    assert_eq!(
        harness.server.observers(&NetworkId(2)).unwrap().iter().copied().collect::<Vec<_>>(),
        vec![a]
    );
}

#[test]
fn late_ready_client_sees_existing_entities() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.run(2);
    harness.server.spawn(NetworkId(8), None).unwrap();
    assert!(harness.server.observers(&NetworkId(8)).unwrap().is_empty());

    harness.clients[index].client.ready().unwrap();
    harness.run(2);

    let id = harness.client_id(index);
    let events = harness.server.take_events();
    assert!(events.contains(&ServerEvent::Ready(id)));
    assert_eq!(spawned(&events), vec![(id, NetworkId(8))]);
}

#[test]
fn owner_disconnect_destroys_its_entities() {
    let mut harness = Harness::new();
    let owner = harness.add_client();
    let watcher = harness.add_client();
    harness.connect_all_ready();
    let (owner, watcher) = (harness.client_id(owner), harness.client_id(watcher));

    harness.server.spawn(NetworkId(3), Some(owner)).unwrap();
    harness.server.take_events();

    harness.network.sever(owner);
    harness.run(1);

    assert!(!harness.server.has_entity(&NetworkId(3)));
    let events = harness.server.take_events();
    assert_eq!(despawned(&events), vec![(watcher, NetworkId(3))]);
    assert!(events.contains(&ServerEvent::Disconnected(owner)));
}

#[test]
fn host_client_entities_are_hidden_not_despawned() {
    let (mut harness, pairs) = harness_with_pairs();
    harness.server.add_host_connection(harness.now).unwrap();
    harness.server.receive_host_batch(
        &mut harness.server_inbox,
        &batch_of(&[packed(&ReadyMessage)], 0.0),
        Channel::Reliable,
        harness.now,
    );
    harness.server.take_events();

    pairs.borrow_mut().insert((NetworkId(1), ConnectionId::LOCAL));
    harness.server.spawn(NetworkId(1), None).unwrap();
    harness.server.spawn(NetworkId(2), None).unwrap();

    let events = harness.server.take_events();
    assert!(events.contains(&ServerEvent::HostVisibility {
        entity: NetworkId(1),
        visible: true
    }));
    assert!(events.contains(&ServerEvent::HostVisibility {
        entity: NetworkId(2),
        visible: false
    }));

    pairs.borrow_mut().clear();
    harness
        .server
        .rebuild_observers(&NetworkId(1), false)
        .unwrap();
    assert!(harness.server.take_events().contains(&ServerEvent::HostVisibility {
        entity: NetworkId(1),
        visible: false
    }));
    assert!(harness.server.has_entity(&NetworkId(1)));
}
