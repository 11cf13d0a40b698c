//! Session records.

use std::time::{Duration, Instant};

use wildcard_protocol::PlayerId;

/// Session layer tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a disconnected player may resume their session before it
    /// expires. Zero disables reconnection.
    pub reconnect_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(30),
        }
    }
}

/// Lifecycle of one session.
///
/// `Connected` moves to `Disconnected` when the socket drops, back to
/// `Connected` on a valid reconnect within the grace period, and to
/// `Expired` once the period elapses. `Expired` is terminal; the player
/// must authenticate from scratch.
#[derive(Debug, Clone)]
pub enum SessionState {
    Connected,
    /// `since` is monotonic; grace is measured against it.
    Disconnected { since: Instant },
    Expired,
}

/// The server's record of one authenticated player.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,
    pub state: SessionState,
    /// Secret issued in the handshake ack; presenting it resumes the
    /// session after a network drop. 32 hex chars, 128 bits.
    pub reconnect_token: String,
}
