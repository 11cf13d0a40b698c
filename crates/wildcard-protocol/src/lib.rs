//! Wire protocol for Wildcard.
//!
//! Everything that travels between a client and the server is defined
//! here: identities, card value types, the action/event vocabulary, the
//! per-recipient [`RoomView`] projection shape, and the [`Envelope`]
//! framing. The [`Codec`] trait converts these types to and from bytes.
//!
//! The protocol layer sits between transport (raw bytes) and the game
//! layers (rooms, sessions). It knows nothing about connections or
//! game rules, only message shapes.

mod cards;
mod codec;
mod error;
mod events;
mod types;

pub use cards::{Card, CardColor, Rank};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{
    CardsView, ClientAction, Direction, GamePhase, RoomView, SeatOccupant,
    SeatView, ServerEvent,
};
pub use types::{
    Envelope, Payload, PlayerId, RoomCode, SeatIndex, SystemMessage,
};
