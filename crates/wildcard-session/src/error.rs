use wildcard_protocol::PlayerId;

/// Session lifecycle failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The credential was rejected by the [`Authenticator`](crate::Authenticator).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No session ledger entry for this player.
    #[error("no session for player {0}")]
    NotFound(PlayerId),

    /// The reconnect token does not match any live session.
    #[error("invalid reconnect token")]
    InvalidToken,

    /// The reconnect grace period has elapsed.
    #[error("session expired for player {0}")]
    Expired(PlayerId),

    /// A player holds at most one live session at a time.
    #[error("player {0} is already connected")]
    AlreadyConnected(PlayerId),
}
