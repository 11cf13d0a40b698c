//! The session ledger.
//!
//! Not internally synchronized: the server wraps the manager in its own
//! lock and every access goes through that. Keeping a plain `HashMap`
//! here avoids a second layer of locking.

use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;
use wildcard_protocol::PlayerId;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Tracks every live session, keyed by player.
///
/// `tokens` is a secondary index from reconnect token to player id and
/// is kept in sync with `sessions` on every mutation.
pub struct SessionManager {
    sessions: HashMap<PlayerId, Session>,
    tokens: HashMap<String, PlayerId>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            config,
        }
    }

    /// Registers a freshly authenticated player and issues a reconnect
    /// token. A leftover disconnected or expired session for the same
    /// player is replaced; a connected one is an error.
    pub fn create(
        &mut self,
        player_id: PlayerId,
    ) -> Result<&Session, SessionError> {
        if let Some(existing) = self.sessions.get(&player_id) {
            if matches!(existing.state, SessionState::Connected) {
                return Err(SessionError::AlreadyConnected(player_id));
            }
            self.tokens.remove(&existing.reconnect_token);
        }

        let token = generate_token();
        self.tokens.insert(token.clone(), player_id);
        self.sessions.insert(
            player_id,
            Session {
                player_id,
                state: SessionState::Connected,
                reconnect_token: token,
            },
        );

        tracing::info!(%player_id, "session created");
        Ok(self.sessions.get(&player_id).expect("just inserted"))
    }

    /// Starts the grace period for a player whose socket dropped.
    pub fn disconnect(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        session.state = SessionState::Disconnected {
            since: Instant::now(),
        };
        tracing::info!(%player_id, "disconnected, grace period running");
        Ok(())
    }

    /// Resumes a disconnected session by its token.
    pub fn reconnect(&mut self, token: &str) -> Result<&Session, SessionError> {
        let player_id = self
            .tokens
            .get(token)
            .copied()
            .ok_or(SessionError::InvalidToken)?;
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::InvalidToken)?;

        match session.state {
            SessionState::Disconnected { since } => {
                if since.elapsed() > self.config.reconnect_grace {
                    session.state = SessionState::Expired;
                    return Err(SessionError::Expired(player_id));
                }
                session.state = SessionState::Connected;
                tracing::info!(%player_id, "reconnected");
                Ok(self.sessions.get(&player_id).expect("present"))
            }
            SessionState::Connected => {
                Err(SessionError::AlreadyConnected(player_id))
            }
            SessionState::Expired => Err(SessionError::Expired(player_id)),
        }
    }

    /// Marks every over-grace disconnected session expired and returns
    /// the affected players so the caller can release their seats.
    pub fn expire_stale(&mut self) -> Vec<PlayerId> {
        let mut expired = Vec::new();
        for session in self.sessions.values_mut() {
            if let SessionState::Disconnected { since } = session.state {
                if since.elapsed() > self.config.reconnect_grace {
                    session.state = SessionState::Expired;
                    expired.push(session.player_id);
                    tracing::info!(
                        player_id = %session.player_id,
                        "session expired"
                    );
                }
            }
        }
        expired
    }

    /// Drops expired sessions and their tokens. Separate from
    /// [`expire_stale`](Self::expire_stale) so callers can react to the
    /// expirations before the records disappear.
    pub fn cleanup_expired(&mut self) {
        let tokens = &mut self.tokens;
        self.sessions.retain(|_, session| {
            if matches!(session.state, SessionState::Expired) {
                tokens.remove(&session.reconnect_token);
                false
            } else {
                true
            }
        });
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// 128 random bits as lowercase hex.
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
