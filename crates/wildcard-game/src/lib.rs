//! The Wildcard game engine.
//!
//! Everything in this crate is pure state-transition logic: no tasks, no
//! channels, no I/O. The coordinator (`wildcard-room`) owns a
//! [`GameState`] and drives it exclusively through [`turn::apply`]; this
//! crate validates and mutates, nothing else.
//!
//! # Key pieces
//!
//! - [`deck`]: 108-card composition, shuffling, and the legality rule
//! - [`GameState`]: the authoritative room aggregate and its invariants
//! - [`turn`]: the turn state machine (play / draw / pass / declare /
//!   challenge)
//! - [`view`]: per-recipient projections that hide other hands
//! - [`bot`]: the scripted decision policy for automated seats

pub mod bot;
pub mod deck;
mod error;
mod state;
pub mod turn;
pub mod view;

pub use bot::{BotMove, BotProfile, BotRoster};
pub use error::GameError;
pub use state::{GameState, Occupant, Rules, Seat};
pub use turn::{Action, TurnError};
