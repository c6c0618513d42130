//! Connection handles and close signalling

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::{ConnId, Msg};

/// Outbox depth per connection
///
/// This doubles as the slow-client threshold: a client that still has two
/// undelivered messages when a third arrives is evicted.
pub const OUTBOX_CAPACITY: usize = 2;

/// Hub-side view of one live client connection
///
/// The socket itself stays with the connection's reader and writer tasks;
/// the hub holds only the outbox sender and the close signal.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnId,
    outbox: mpsc::Sender<Msg>,
    close: CloseHandle,
}

impl Connection {
    /// Create a connection handle from its outbox sender and close signal
    pub fn new(id: ConnId, outbox: mpsc::Sender<Msg>, close: CloseHandle) -> Self {
        Self { id, outbox, close }
    }

    /// Connection identifier
    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Enqueue a message without blocking
    pub fn try_send(&self, message: Msg) -> Result<(), mpsc::error::TrySendError<Msg>> {
        self.outbox.try_send(message)
    }

    /// The connection's close signal
    pub fn close_handle(&self) -> &CloseHandle {
        &self.close
    }
}

/// Idempotent open-to-closed signal for one connection
///
/// Shared by the reader task, the writer task and the hub's eviction path;
/// any of them may close first and the others observe it. `close` is
/// synchronous and never blocks.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    /// Create an open handle
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal close; safe to call any number of times
    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    /// Whether close has been signalled
    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }

    /// Create a listener that resolves once the connection closes
    pub fn listen(&self) -> CloseListener {
        CloseListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CloseHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for a connection's close signal
#[derive(Debug, Clone)]
pub struct CloseListener {
    rx: watch::Receiver<bool>,
}

impl CloseListener {
    /// Resolve once the connection is closed
    pub async fn wait(&mut self) {
        // Err means every handle is gone, which only happens once the
        // connection's tasks have exited; treat it as closed.
        let _ = self.rx.wait_for(|closed| *closed).await;
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::error::TrySendError;
    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready};

    use super::*;

    #[test]
    fn test_close_is_idempotent() {
        let handle = CloseHandle::new();
        assert!(!handle.is_closed());

        handle.close();
        handle.close();
        assert!(handle.is_closed());
    }

    #[test]
    fn test_close_wakes_listener() {
        let handle = CloseHandle::new();
        let mut listener = handle.listen();
        let mut wait = task::spawn(async move { listener.wait().await });

        assert_pending!(wait.poll());

        handle.close();
        assert!(wait.is_woken());
        assert_ready!(wait.poll());
    }

    #[test]
    fn test_listener_created_after_close_resolves() {
        let handle = CloseHandle::new();
        handle.close();

        let mut listener = handle.listen();
        let mut wait = task::spawn(async move { listener.wait().await });
        assert_ready!(wait.poll());
    }

    #[tokio::test]
    async fn test_outbox_capacity_bounds_pending_messages() {
        let (tx, mut rx) = mpsc::channel(OUTBOX_CAPACITY);
        let conn = Connection::new(1, tx, CloseHandle::new());

        assert!(conn.try_send("a".to_string()).is_ok());
        assert!(conn.try_send("b".to_string()).is_ok());
        assert!(matches!(
            conn.try_send("c".to_string()),
            Err(TrySendError::Full(_))
        ));

        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert_eq!(rx.recv().await.as_deref(), Some("b"));
    }
}
