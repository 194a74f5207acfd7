mod server;
pub use server::Server;

mod server_config;
pub use server_config::ServerConfig;

mod host_loopback;
pub use host_loopback::HOST_MAX_PACKET_SIZE;
