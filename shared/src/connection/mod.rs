mod connection;
mod connection_config;
mod connection_state;
mod error;

pub use connection::{Connection, ConnectionTeardown};
pub use connection_config::ConnectionConfig;
pub use connection_state::ConnectionState;
pub use error::ConnectionError;
