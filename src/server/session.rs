//! Per-connection session lifecycle
//!
//! Each accepted socket gets a writer task draining the connection's outbox
//! and a reader loop running on the session's own task. The reader answers
//! [`PING`] and discards everything else a client sends. Whichever side
//! stops first signals close; the other observes it and exits, and the hub
//! entry is always removed before the session returns.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;

use crate::error::Error;
use crate::hub::{CloseHandle, ConnId, Connection, HubHandle, Msg, OUTBOX_CAPACITY};
use crate::server::transport::{self, Inbound, Outbound};

/// Client request answered with [`PONG`] on the same connection
///
/// Reserved for connection keepalive; it is the only client payload the
/// server reacts to.
pub const PING: &str = "Ping";

/// Reply to [`PING`]
pub const PONG: &str = "Pong";

/// Run one client session to completion
pub(crate) async fn run(
    socket: TcpStream,
    peer_addr: SocketAddr,
    conn_id: ConnId,
    hub: HubHandle,
    handshake_timeout: Duration,
) -> crate::Result<()> {
    let ws = match tokio::time::timeout(handshake_timeout, accept_async(socket)).await {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => return Err(Error::Handshake(e)),
        Err(_) => return Err(Error::HandshakeTimeout),
    };

    let (outbox_tx, outbox_rx) = mpsc::channel(OUTBOX_CAPACITY);
    let close = CloseHandle::new();
    let (inbound, outbound) = transport::split(ws, close.clone());

    hub.register(Connection::new(conn_id, outbox_tx, close));
    tracing::debug!(conn_id = conn_id, peer = %peer_addr, "Client connected");

    let writer = tokio::spawn(write_loop(outbox_rx, Arc::clone(&outbound)));

    read_loop(inbound, &outbound).await;

    // Whatever ended the reader, the hub entry must go.
    hub.unregister(conn_id);
    let _ = writer.await;

    tracing::debug!(conn_id = conn_id, peer = %peer_addr, "Client disconnected");
    Ok(())
}

async fn read_loop(mut inbound: Inbound, outbound: &Outbound) {
    while let Some(text) = inbound.recv().await {
        if text.as_str() == PING {
            if outbound.send(PONG).await.is_err() {
                break;
            }
        }
        // Anything else is accepted and discarded.
    }
    outbound.close();
}

async fn write_loop(mut outbox: mpsc::Receiver<Msg>, outbound: Arc<Outbound>) {
    while let Some(message) = outbox.recv().await {
        if outbound.send(message).await.is_err() {
            break;
        }
    }
    outbound.close();
}
