//! Identity types and the top-level message framing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ClientAction, ServerEvent};

/// A unique identifier for an authenticated player.
///
/// Issued by the embedder's authenticator during the handshake; the
/// core treats it as opaque. `#[serde(transparent)]` keeps the wire form
/// a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A human-shareable room identifier, immutable after creation.
///
/// Six uppercase letters by convention, but the protocol accepts any
/// non-empty string so embedders can plug in their own code scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fixed turn-order slot in a room. Assigned at join time; defines the
/// rotation the turn pointer walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatIndex(pub usize);

impl fmt::Display for SeatIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat-{}", self.0)
    }
}

/// Framework-level messages: connection lifecycle and room membership.
///
/// Internally tagged (`{"type": "JoinRoom", "code": "KWXQTB"}`) so the
/// JSON stays friendly to browser clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: first message on every connection. `token` is
    /// the embedder-issued credential the authenticator validates.
    Handshake { version: u32, token: String },

    /// Server → Client: handshake accepted. `reconnect_token` lets the
    /// client resume this session after a brief network drop.
    HandshakeAck {
        player_id: PlayerId,
        reconnect_token: String,
    },

    /// Either direction: orderly close with a human-readable reason.
    Disconnect { reason: String },

    /// Client → Server keep-alive.
    Heartbeat { client_time: u64 },

    /// Server → Client keep-alive echo.
    HeartbeatAck { client_time: u64 },

    /// Client → Server: create a fresh room with the sender seated as
    /// its owner.
    CreateRoom,

    /// Client → Server: take a seat in an existing room.
    JoinRoom { code: RoomCode },

    /// Client → Server: give up the current seat (waiting rooms only).
    LeaveRoom,

    /// Server → Client: the sender now occupies `seat` in room `code`.
    RoomJoined { code: RoomCode, seat: SeatIndex },

    /// Server → Client: request failed. `code` follows HTTP conventions
    /// (400 bad request, 404 unknown room, 409 conflict).
    Error { code: u16, message: String },
}

/// The content of an envelope.
///
/// Adjacently tagged: `{"type": "Action", "data": {...}}`. The three
/// arms separate plumbing ([`SystemMessage`]) from game traffic in each
/// direction ([`ClientAction`] inbound, [`ServerEvent`] outbound).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    Action(ClientAction),
    Event(ServerEvent),
}

/// The top-level wire frame. Every message is one `Envelope`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender sequence number, for ordering diagnostics.
    pub seq: u64,
    pub payload: Payload,
}
