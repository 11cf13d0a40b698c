//! Transport seam: how bytes reach the server.
//!
//! The server core is written against the [`Transport`] and
//! [`Connection`] traits; the only implementation shipped here is
//! WebSocket via `tokio-tungstenite` (the `websocket` feature, on by
//! default). Framing and JSON live a layer up in `wildcard-protocol`;
//! this crate moves opaque byte messages.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque per-process identifier for one connection. Used in logs and to
/// key per-connection state; never sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Listens for and accepts incoming connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Stops accepting new connections. Existing connections live on.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// One bidirectional message stream.
///
/// `send` and `recv` take `&self` and must not block each other: the
/// server drives them from separate tasks on a shared handle.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next message from the peer. `Ok(None)` means a clean close.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
