//! The unified server error.

use wildcard_protocol::ProtocolError;
use wildcard_room::RoomError;
use wildcard_session::SessionError;
use wildcard_transport::TransportError;

/// Wraps every layer's error so server code and embedders work with one
/// type and plain `?`.
#[derive(Debug, thiserror::Error)]
pub enum WildcardError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),
}
