//! Room-aggregate errors.

use wildcard_protocol::PlayerId;

/// Errors from seat management, lifecycle, and invariant checks.
///
/// Everything except `InvariantViolation` is a plain validation failure:
/// the state is untouched and the caller reports it to the acting client.
/// `InvariantViolation` signals an engine defect; the coordinator must
/// take the room out of service rather than swallow it.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("room is full")]
    RoomFull,

    #[error("player {0} is already seated")]
    AlreadySeated(PlayerId),

    #[error("player {0} is not seated in this room")]
    NotSeated(PlayerId),

    #[error("room is no longer accepting seat changes")]
    NotWaiting,

    #[error("need at least {need} seats to start, have {have}")]
    NotEnoughSeats { have: usize, need: usize },

    #[error("game state invariant violated: {0}")]
    InvariantViolation(String),
}
