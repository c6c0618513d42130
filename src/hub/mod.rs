//! Connection hub
//!
//! The hub tracks every live client connection and fans broadcast messages
//! out to all of them. A single task owns the connection map; registration,
//! unregistration and broadcast requests arrive on three FIFO queues and are
//! applied one at a time, so the map is always internally consistent and
//! callers never touch a lock.
//!
//! # Architecture
//!
//! ```text
//!                      HubHandle (Clone)
//!       register(conn)    unregister(id)    deliver(msg)
//!             │                 │                │
//!             ▼                 ▼                ▼
//!     ┌──────────────────────────────────────────────────┐
//!     │ Hub::run (single task)                           │
//!     │   connections: HashMap<ConnId, Connection {      │
//!     │     outbox: mpsc::Sender<Msg>,                   │
//!     │     close: CloseHandle,                          │
//!     │   }>                                             │
//!     └───────────────┬─────────────────┬────────────────┘
//!                     │ try_send        │ try_send
//!                     ▼                 ▼
//!               [writer task]     [writer task]
//!               outbox.recv()     outbox.recv()
//!                     │                 │
//!                     ▼                 ▼
//!                 WebSocket         WebSocket
//! ```
//!
//! # Slow clients
//!
//! Delivery is best-effort. Each connection has a small bounded outbox and
//! broadcasts are enqueued with `try_send`; a connection whose outbox is
//! full is evicted on the spot rather than allowed to stall the others. The
//! hub never awaits a client.

pub mod connection;
pub mod core;

pub use connection::{CloseHandle, CloseListener, Connection, OUTBOX_CAPACITY};
pub use self::core::{Hub, HubHandle};

/// Identifier for a registered connection
pub type ConnId = u64;

/// Broadcast payload
///
/// Payloads are short opaque text; the hub never inspects them.
pub type Msg = String;
