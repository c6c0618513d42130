//! Hub control loop
//!
//! The central loop that serializes all changes to the connection set. It
//! is the only code that touches the map, so registration, unregistration
//! and broadcasts never race each other.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::connection::Connection;
use super::{ConnId, Msg};

/// The connection hub
///
/// Owns the map of live connections. Create it once at startup and spawn
/// [`Hub::run`]; all interaction goes through the [`HubHandle`] returned
/// alongside it.
pub struct Hub {
    connections: HashMap<ConnId, Connection>,
    register_rx: mpsc::UnboundedReceiver<Connection>,
    unregister_rx: mpsc::UnboundedReceiver<ConnId>,
    broadcast_rx: mpsc::UnboundedReceiver<Msg>,
}

impl Hub {
    /// Create the hub and the handle used to talk to it
    pub fn new() -> (Self, HubHandle) {
        let (register_tx, register_rx) = mpsc::unbounded_channel();
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

        let hub = Self {
            connections: HashMap::new(),
            register_rx,
            unregister_rx,
            broadcast_rx,
        };
        let handle = HubHandle {
            register_tx,
            unregister_tx,
            broadcast_tx,
        };

        (hub, handle)
    }

    /// Number of live connections
    #[cfg(test)]
    fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Run the control loop
    ///
    /// Requests are applied one at a time in per-queue FIFO order. Returns
    /// once every [`HubHandle`] has been dropped and the queues are drained;
    /// no connection failure terminates the loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(conn) = self.register_rx.recv() => self.register(conn),
                Some(id) = self.unregister_rx.recv() => self.unregister(id),
                Some(message) = self.broadcast_rx.recv() => self.broadcast(message),
                else => break,
            }
        }
        tracing::debug!("Hub loop stopped");
    }

    fn register(&mut self, conn: Connection) {
        let id = conn.id();
        if self.connections.insert(id, conn).is_some() {
            tracing::warn!(conn_id = id, "Replaced connection with duplicate id");
        }
        tracing::debug!(
            conn_id = id,
            connections = self.connections.len(),
            "Connection registered"
        );
    }

    fn unregister(&mut self, id: ConnId) {
        // Dropping the entry closes its outbox, which stops the writer task.
        if self.connections.remove(&id).is_some() {
            tracing::debug!(
                conn_id = id,
                connections = self.connections.len(),
                "Connection unregistered"
            );
        }
    }

    fn broadcast(&mut self, message: Msg) {
        tracing::info!(
            message = %message,
            connections = self.connections.len(),
            "Broadcasting"
        );

        let mut evicted = Vec::new();
        for conn in self.connections.values() {
            match conn.try_send(message.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(conn_id = conn.id(), "Outbox full, dropping slow connection");
                    evicted.push(conn.id());
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(conn_id = conn.id(), "Outbox closed, dropping connection");
                    evicted.push(conn.id());
                }
            }
        }

        for id in evicted {
            if let Some(conn) = self.connections.remove(&id) {
                // Signal only; the connection's own tasks drop the socket.
                conn.close_handle().close();
            }
        }
    }
}

/// Cloneable handle for talking to the hub
///
/// Every operation enqueues a request and returns immediately. Requests can
/// only be lost once the hub task has exited, which happens at shutdown.
#[derive(Debug, Clone)]
pub struct HubHandle {
    register_tx: mpsc::UnboundedSender<Connection>,
    unregister_tx: mpsc::UnboundedSender<ConnId>,
    broadcast_tx: mpsc::UnboundedSender<Msg>,
}

impl HubHandle {
    /// Add a connection to the hub's view
    pub fn register(&self, conn: Connection) {
        let _ = self.register_tx.send(conn);
    }

    /// Remove a connection; a no-op if it is already gone
    pub fn unregister(&self, id: ConnId) {
        let _ = self.unregister_tx.send(id);
    }

    /// Queue a message for delivery to every live connection
    ///
    /// This is the entry point for event sources. It never blocks; delivery
    /// to any individual client is best-effort.
    pub fn deliver(&self, message: impl Into<Msg>) {
        let _ = self.broadcast_tx.send(message.into());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::{sleep, timeout};

    use super::super::connection::{CloseHandle, OUTBOX_CAPACITY};
    use super::*;

    fn test_conn(id: ConnId) -> (Connection, mpsc::Receiver<Msg>, CloseHandle) {
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        let close = CloseHandle::new();
        (Connection::new(id, tx, close.clone()), rx, close)
    }

    #[tokio::test]
    async fn test_broadcast_delivers_in_fifo_order() {
        let (mut hub, _handle) = Hub::new();
        let (conn, mut rx, _close) = test_conn(1);

        hub.register(conn);
        hub.broadcast("19".to_string());
        hub.broadcast("16".to_string());

        assert_eq!(rx.recv().await.as_deref(), Some("19"));
        assert_eq!(rx.recv().await.as_deref(), Some("16"));
    }

    #[test]
    fn test_broadcast_with_no_connections_is_a_noop() {
        let (mut hub, _handle) = Hub::new();

        hub.broadcast("19".to_string());

        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_full_outbox_evicts_connection() {
        let (mut hub, _handle) = Hub::new();
        let (conn, mut rx, close) = test_conn(1);

        hub.register(conn);
        hub.broadcast("19".to_string());
        hub.broadcast("20".to_string());
        hub.broadcast("16".to_string());

        assert_eq!(hub.connection_count(), 0);
        assert!(close.is_closed());

        // The first two messages were already queued; the third never was.
        assert_eq!(rx.recv().await.as_deref(), Some("19"));
        assert_eq!(rx.recv().await.as_deref(), Some("20"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_slow_connection_does_not_affect_others() {
        let (mut hub, _handle) = Hub::new();
        let (slow, _slow_rx, slow_close) = test_conn(1);
        let (healthy, mut healthy_rx, healthy_close) = test_conn(2);

        hub.register(slow);
        hub.register(healthy);

        hub.broadcast("19".to_string());
        assert_eq!(healthy_rx.recv().await.as_deref(), Some("19"));
        hub.broadcast("20".to_string());
        assert_eq!(healthy_rx.recv().await.as_deref(), Some("20"));
        hub.broadcast("16".to_string());
        assert_eq!(healthy_rx.recv().await.as_deref(), Some("16"));

        assert_eq!(hub.connection_count(), 1);
        assert!(slow_close.is_closed());
        assert!(!healthy_close.is_closed());
    }

    #[tokio::test]
    async fn test_reregistering_an_id_replaces_the_entry() {
        let (mut hub, _handle) = Hub::new();
        let (old, mut old_rx, _old_close) = test_conn(1);
        let (new, mut new_rx, _new_close) = test_conn(1);

        hub.register(old);
        hub.register(new);
        assert_eq!(hub.connection_count(), 1);

        hub.broadcast("19".to_string());
        assert_eq!(new_rx.recv().await.as_deref(), Some("19"));
        // The replaced entry's outbox was dropped, so its writer sees close.
        assert_eq!(old_rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let (mut hub, _handle) = Hub::new();
        let (conn, _rx, _close) = test_conn(7);

        hub.register(conn);
        hub.unregister(7);
        hub.unregister(7);
        hub.unregister(99);

        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_outbox_evicts_on_broadcast() {
        let (mut hub, _handle) = Hub::new();
        let (conn, rx, close) = test_conn(3);

        hub.register(conn);
        drop(rx); // as if the writer task died without unregistering

        hub.broadcast("19".to_string());

        assert_eq!(hub.connection_count(), 0);
        assert!(close.is_closed());
    }

    #[tokio::test]
    async fn test_run_loop_end_to_end() {
        let (hub, handle) = Hub::new();
        let hub_task = tokio::spawn(hub.run());

        let (conn, mut rx, _close) = test_conn(1);
        handle.register(conn);
        sleep(Duration::from_millis(50)).await;

        handle.deliver("19");
        let received = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("delivery timed out");
        assert_eq!(received.as_deref(), Some("19"));

        handle.unregister(1);
        let closed = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("unregister timed out");
        assert_eq!(closed, None);

        drop(handle);
        timeout(Duration::from_secs(1), hub_task)
            .await
            .expect("hub loop did not stop")
            .expect("hub task panicked");
    }
}
