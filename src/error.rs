//! Crate error types

use tokio_tungstenite::tungstenite;

/// Convenience alias for operations that can fail with [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for relay server operations
///
/// Transport failures on an established connection are not represented here;
/// they end the connection's tasks and are logged, nothing more.
#[derive(Debug)]
pub enum Error {
    /// Socket-level failure (bind, accept, socket options)
    Io(std::io::Error),
    /// WebSocket handshake failed
    Handshake(tungstenite::Error),
    /// WebSocket handshake did not complete in time
    HandshakeTimeout,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Handshake(e) => write!(f, "WebSocket handshake failed: {}", e),
            Error::HandshakeTimeout => write!(f, "WebSocket handshake timed out"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Handshake(e) => Some(e),
            Error::HandshakeTimeout => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
