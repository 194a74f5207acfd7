/// Full client/server exchanges over the in-memory transport

use tern_client::{ClientConfig, ClientEvent};
use tern_server::ServerConfig;
use tern_shared::{Channel, ConnectionQuality, ConnectionQualityMethod};
use tern_test::{ChatMessage, Harness, LinkConditioner, LocalNetwork, PositionMessage};

#[test]
fn chat_round_trip() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.connect_all_ready();
    let id = harness.client_id(index);

    harness.clients[index]
        .client
        .send(&ChatMessage::new("hello"), Channel::Reliable)
        .unwrap();
    harness.run(2);
    assert_eq!(harness.server_inbox.chat, vec![(id, "hello".to_string())]);

    harness
        .server
        .send_to(&id, &ChatMessage::new("welcome"), Channel::Reliable)
        .unwrap();
    harness.run(2);
    assert_eq!(
        harness.clients[index].inbox.chat,
        vec![(tern_shared::ConnectionId::SERVER, "welcome".to_string())]
    );
}

#[test]
fn broadcast_reaches_ready_clients_only() {
    let mut harness = Harness::new();
    let ready = harness.add_client();
    harness.connect_all_ready();
    let loading = harness.add_client();
    harness.run(2);

    let position = PositionMessage {
        entity: 1,
        x: 1.5,
        y: -2.0,
    };
    assert_eq!(harness.server.broadcast(&position, Channel::Unreliable), 1);
    harness.run(2);

    assert_eq!(harness.clients[ready].inbox.positions, vec![position]);
    assert!(harness.clients[loading].inbox.positions.is_empty());
}

#[test]
fn many_small_messages_share_batches() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.connect_all_ready();
    let id = harness.client_id(index);

    for i in 0..500 {
        harness
            .server
            .send_to(
                &id,
                &PositionMessage {
                    entity: i,
                    x: 0.0,
                    y: 0.0,
                },
                Channel::Reliable,
            )
            .unwrap();
    }
    harness.run(2);

    let positions = &harness.clients[index].inbox.positions;
    assert_eq!(positions.len(), 500);
    assert!(positions
        .iter()
        .enumerate()
        .all(|(i, position)| position.entity as usize == i));

    let stats = harness.server.connection(&id).unwrap().diagnostics();
    assert!(stats.total_outbound().count >= 500);
}

#[test]
fn oversized_messages_are_refused() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.connect_all_ready();

    let text = "x".repeat(2000);
    assert!(harness.clients[index]
        .client
        .send(&ChatMessage::new(&text), Channel::Unreliable)
        .is_err());
    // the reliable channel has room for it
    assert!(harness.clients[index]
        .client
        .send(&ChatMessage::new(&text), Channel::Reliable)
        .is_ok());
    harness.run(2);
    assert_eq!(harness.server_inbox.chat.len(), 1);
}

#[test]
fn rtt_is_measured_both_ways() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.connect_all_ready();
    harness.run(60);

    let id = harness.client_id(index);
    let client_rtt = harness.clients[index].client.rtt();
    let server_rtt = harness.server.connection(&id).unwrap().network_time().rtt();

    // one tick each way
    assert!(client_rtt > 0.0 && client_rtt < 0.1, "client rtt {client_rtt}");
    assert!(server_rtt > 0.0 && server_rtt < 0.1, "server rtt {server_rtt}");
}

#[test]
fn quality_is_reported() {
    let mut harness = Harness::new();
    let index = harness.add_client();
    harness.connect_all_ready();
    harness.run(200);

    let client = &mut harness.clients[index].client;
    assert_eq!(client.quality(), ConnectionQuality::Excellent);
    assert!(client.take_events().contains(&ClientEvent::QualityChanged {
        previous: ConnectionQuality::Estimating,
        current: ConnectionQuality::Excellent,
    }));
}

#[test]
fn pragmatic_quality_drops_on_a_jittery_link() {
    let network = LocalNetwork::with_conditioner(LinkConditioner::jitter(12, 3));
    let mut harness = Harness::with_network(network, ServerConfig::default());
    let index = harness.add_client_with(ClientConfig {
        connection_quality_method: ConnectionQualityMethod::Pragmatic,
        ..Default::default()
    });
    harness.connect_all_ready();
    harness.run(400);

    let quality = harness.clients[index].client.quality();
    assert!(
        matches!(quality, ConnectionQuality::Poor | ConnectionQuality::Fair),
        "quality was {quality:?}"
    );
}

#[test]
fn lossy_link_keeps_reliable_traffic() {
    let network = LocalNetwork::with_conditioner(LinkConditioner {
        loss: 0.5,
        max_delay_ticks: 0,
        seed: 11,
    });
    let mut harness = Harness::with_network(network, ServerConfig::default());
    let index = harness.add_client();
    harness.connect_all_ready();

    for i in 0..20 {
        harness.clients[index]
            .client
            .send(&ChatMessage::new(&i.to_string()), Channel::Reliable)
            .unwrap();
        harness.tick();
    }
    harness.run(2);

    assert_eq!(harness.server_inbox.chat.len(), 20);
    assert!(harness.network.dropped() > 0);
}
