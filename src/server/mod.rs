//! WebSocket relay server
//!
//! Accepts client connections, runs a session per socket and delivers hub
//! broadcasts to every live client.

pub mod config;
pub mod listener;
pub mod session;
pub(crate) mod transport;

pub use config::ServerConfig;
pub use listener::RelayServer;
pub use session::{PING, PONG};
