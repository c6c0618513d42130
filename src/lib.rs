//! keyrelay: media-key trigger relay over WebSocket
//!
//! A small daemon core that relays discrete trigger events (media-key
//! presses) to every connected WebSocket client. Clients are typically
//! browser extensions that translate the relayed code strings into player
//! actions.
//!
//! # Architecture
//!
//! - [`hub`]: the connection hub. A single task owns the set of live
//!   connections; registration, unregistration and broadcasts are serialized
//!   through its queues. Slow clients are evicted rather than allowed to
//!   stall delivery to others.
//! - [`server`]: the WebSocket listener and per-connection sessions (reader
//!   and writer task per client, `"Ping"`/`"Pong"` keepalive).
//! - [`trigger`]: the input boundary. Maps named triggers to client code
//!   strings and delivers them to the hub.
//!
//! # Example
//!
//! ```no_run
//! use keyrelay::hub::Hub;
//! use keyrelay::server::{RelayServer, ServerConfig};
//! use keyrelay::trigger::{TriggerMap, TriggerSource, NEXT_TRACK};
//!
//! #[tokio::main]
//! async fn main() -> keyrelay::Result<()> {
//!     let (hub, handle) = Hub::new();
//!     tokio::spawn(hub.run());
//!
//!     let map = TriggerMap::new().bind("XF86AudioNext", NEXT_TRACK);
//!     tokio::spawn(TriggerSource::new(map, handle.clone()).run());
//!
//!     RelayServer::new(ServerConfig::default(), handle).run().await
//! }
//! ```

pub mod error;
pub mod hub;
pub mod server;
pub mod trigger;

pub use error::{Error, Result};
pub use hub::{Hub, HubHandle};
pub use server::{RelayServer, ServerConfig};
