use tern_client::{Client, ClientConfig};
use tern_server::{Server, ServerConfig};
use tern_shared::{Channel, Connection, ConnectionId};

use crate::{
    local_transport::{LocalClientTransport, LocalNetwork, LocalServerTransport},
    test_protocol::{ChatMessage, PositionMessage},
};

/// Fixed tick length, 60 Hz
pub const STEP: f64 = 1.0 / 60.0;

/// What handlers received, for assertions
#[derive(Default, Debug)]
pub struct Inbox {
    pub chat: Vec<(ConnectionId, String)>,
    pub positions: Vec<PositionMessage>,
}

pub struct TestClient {
    pub client: Client<LocalClientTransport, Inbox>,
    pub inbox: Inbox,
}

impl TestClient {
    pub fn id(&self) -> ConnectionId {
        self.client.transport().id()
    }
}

/// Drives one server and its clients in lockstep over a `LocalNetwork`
pub struct Harness {
    pub network: LocalNetwork,
    pub server: Server<LocalServerTransport, Inbox>,
    pub server_inbox: Inbox,
    pub clients: Vec<TestClient>,
    pub now: f64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_network(LocalNetwork::new(), ServerConfig::default())
    }

    pub fn with_network(network: LocalNetwork, config: ServerConfig) -> Self {
        let mut server: Server<LocalServerTransport, Inbox> =
            Server::new(config, network.server_transport()).unwrap();
        server
            .register_handler::<ChatMessage, _>(true, |inbox, connection, message, _| {
                inbox.chat.push((connection.id(), message.text));
                Ok(())
            })
            .unwrap();

        Self {
            network,
            server,
            server_inbox: Inbox::default(),
            clients: Vec::new(),
            now: 0.0,
        }
    }

    /// Connects a new client with the default config. Returns its index in
    /// `clients`.
    pub fn add_client(&mut self) -> usize {
        self.add_client_with(ClientConfig::default())
    }

    pub fn add_client_with(&mut self, config: ClientConfig) -> usize {
        let mut client = Client::new(config, self.network.connect_client()).unwrap();
        client
            .register_handler::<ChatMessage, _>(false, record_chat)
            .unwrap();
        client
            .register_handler::<PositionMessage, _>(false, |inbox, _, message, _| {
                inbox.positions.push(message);
                Ok(())
            })
            .unwrap();
        client.connect(self.now).unwrap();

        self.clients.push(TestClient {
            client,
            inbox: Inbox::default(),
        });
        self.clients.len() - 1
    }

    pub fn client_id(&self, index: usize) -> ConnectionId {
        self.clients[index].id()
    }

    /// One frame: early phase everywhere, then late phase everywhere
    pub fn tick(&mut self) {
        self.now += STEP;
        self.network.tick();

        self.server.receive(&mut self.server_inbox, self.now);
        for test_client in &mut self.clients {
            test_client
                .client
                .receive(&mut test_client.inbox, self.now);
        }

        self.server.send(self.now);
        for test_client in &mut self.clients {
            test_client.client.send_updates(self.now);
        }
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Ticks until every client is connected, then marks each one ready
    pub fn connect_all_ready(&mut self) {
        self.run(2);
        for test_client in &mut self.clients {
            test_client.client.ready().unwrap();
        }
        self.run(2);
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

fn record_chat(
    inbox: &mut Inbox,
    connection: &mut Connection,
    message: ChatMessage,
    _channel: Channel,
) -> tern_shared::HandlerResult {
    inbox.chat.push((connection.id(), message.text));
    Ok(())
}
