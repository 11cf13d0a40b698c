//! Room layer errors.

use wildcard_game::GameError;
use wildcard_protocol::{PlayerId, RoomCode};

/// Failures surfaced by the room layer.
///
/// Seat and lifecycle validation comes from the game engine via the
/// `Game` variant; `Corrupt` means the room tripped an engine invariant
/// and was taken out of service.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room task is gone or its mailbox is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),

    /// A player sits in at most one room at a time.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    #[error("player {0} is not in any room")]
    NotInRoom(PlayerId),

    #[error("room {0} is corrupted and out of service")]
    Corrupt(RoomCode),

    #[error(transparent)]
    Game(#[from] GameError),
}
