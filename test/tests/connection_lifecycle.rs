/// Connect, authenticate, ready, not ready, timeouts and disconnects

use tern_client::ClientEvent;
use tern_server::{ServerConfig, ServerEvent};
use tern_shared::{Channel, ConnectionState};
use tern_test::{ChatMessage, Harness, LocalNetwork};

#[test]
fn connect_then_ready() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.run(2);

    let id = harness.client_id(index);
    assert_eq!(
        harness.server.connection(&id).unwrap().state(),
        ConnectionState::Connected { ready: false }
    );
    assert_eq!(
        harness.clients[index].client.take_events(),
        vec![ClientEvent::Connected]
    );

    harness.clients[index].client.ready().unwrap();
    harness.run(2);

    assert!(harness.server.connection(&id).unwrap().is_ready());
    assert_eq!(
        harness.server.take_events(),
        vec![ServerEvent::Connected(id), ServerEvent::Ready(id)]
    );
}

#[test]
fn manual_authentication_gates_ready() {
    let config = ServerConfig {
        auto_authenticate: false,
        ..Default::default()
    };
    let mut harness = Harness::with_network(LocalNetwork::new(), config);
    let index = harness.add_client();
    harness.run(2);
    let id = harness.client_id(index);

    harness.server.authenticate(&id).unwrap();
    harness.clients[index].client.ready().unwrap();
    harness.run(2);

    assert!(harness.server.connection(&id).unwrap().is_ready());
}

#[test]
fn server_sets_client_not_ready() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.connect_all_ready();
    let id = harness.client_id(index);

    harness.server.set_client_not_ready(&id).unwrap();
    harness.run(2);

    assert!(!harness.server.connection(&id).unwrap().is_ready());
    assert!(!harness.clients[index].client.is_ready());
    assert!(harness.clients[index]
        .client
        .take_events()
        .contains(&ClientEvent::NotReady));

    // ready again
    harness.clients[index].client.ready().unwrap();
    harness.run(2);
    assert!(harness.server.connection(&id).unwrap().is_ready());
}

#[test]
fn server_disconnect_reaches_the_client() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.connect_all_ready();
    let id = harness.client_id(index);

    harness.server.disconnect(&id).unwrap();
    assert_eq!(
        harness.server.connection(&id).unwrap().state(),
        ConnectionState::Disconnecting
    );
    harness.run(2);

    assert!(harness.server.connection(&id).is_none());
    assert!(!harness.network.is_connected(id));
    assert!(harness.clients[index]
        .client
        .take_events()
        .contains(&ClientEvent::Disconnected));
    assert!(harness.clients[index]
        .client
        .send(&ChatMessage::new("anyone?"), Channel::Reliable)
        .is_err());
}

#[test]
fn client_disconnect_reaches_the_server() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.connect_all_ready();
    let id = harness.client_id(index);

    harness.clients[index].client.disconnect();
    harness.run(2);

    assert!(harness.server.connection(&id).is_none());
    assert!(harness
        .server
        .take_events()
        .contains(&tern_server::ServerEvent::Disconnected(id)));
}

#[test]
fn silent_clients_time_out() {
    let mut config = ServerConfig::default();
    config.connection.disconnect_inactive_timeout = 1.0;
    let mut harness = Harness::with_network(LocalNetwork::new(), config);
    let index = harness.add_client();
    harness.run(2);
    let id = harness.client_id(index);

    // the client keeps pinging, so it stays
    harness.run(120);
    assert!(harness.server.connection(&id).is_some());

    // a client that stops ticking goes quiet
    let quiet = harness.clients.remove(index);
    harness.run(120);
    assert!(harness.server.connection(&quiet.id()).is_none());
}
