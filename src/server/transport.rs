//! WebSocket transport halves
//!
//! Splits an accepted socket into an [`Inbound`] read half and a shared
//! [`Outbound`] write half. Both race every operation against the
//! connection's close signal, so a hub eviction aborts I/O that is blocked
//! on a stalled peer.
//!
//! Closing never performs a WebSocket close handshake: once both halves'
//! tasks exit, the socket is dropped and the peer sees a plain transport
//! failure.

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message, Utf8Bytes};
use tokio_tungstenite::WebSocketStream;

use crate::hub::{CloseHandle, CloseListener};

/// Write half, shared by the writer task and the keepalive reply path
pub(crate) struct Outbound {
    sink: Mutex<SplitSink<WebSocketStream<TcpStream>, Message>>,
    close: CloseHandle,
}

impl Outbound {
    /// Send a text message
    ///
    /// Aborts with `ConnectionClosed` as soon as the close signal fires,
    /// even if the send is blocked on a stalled peer.
    pub(crate) async fn send(
        &self,
        text: impl Into<Utf8Bytes>,
    ) -> Result<(), tungstenite::Error> {
        let message = Message::text(text);
        let mut closed = self.close.listen();

        tokio::select! {
            biased;
            _ = closed.wait() => Err(tungstenite::Error::ConnectionClosed),
            result = async { self.sink.lock().await.send(message).await } => result,
        }
    }

    /// Signal close
    pub(crate) fn close(&self) {
        self.close.close();
    }
}

/// Read half plus the connection's close signal
pub(crate) struct Inbound {
    stream: SplitStream<WebSocketStream<TcpStream>>,
    closed: CloseListener,
}

impl Inbound {
    /// Receive the next text payload
    ///
    /// Returns `None` on end of stream, transport error, a Close frame, or
    /// once the close signal fires. Non-text frames are skipped.
    pub(crate) async fn recv(&mut self) -> Option<Utf8Bytes> {
        loop {
            let frame = tokio::select! {
                biased;
                _ = self.closed.wait() => return None,
                frame = self.stream.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => return Some(text),
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "WebSocket receive failed");
                    return None;
                }
            }
        }
    }
}

/// Split an accepted WebSocket into its transport halves
pub(crate) fn split(
    socket: WebSocketStream<TcpStream>,
    close: CloseHandle,
) -> (Inbound, Arc<Outbound>) {
    let (sink, stream) = socket.split();

    let inbound = Inbound {
        stream,
        closed: close.listen(),
    };
    let outbound = Arc::new(Outbound {
        sink: Mutex::new(sink),
        close,
    });

    (inbound, outbound)
}
