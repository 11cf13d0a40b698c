//! Room coordination.
//!
//! Every room runs as its own Tokio task owning a
//! [`GameState`](wildcard_game::GameState). The task's mailbox is the
//! room's serialization point: commands are processed one at a time, so
//! the game never sees concurrent mutation and every broadcast for one
//! transition is queued before the next command is looked at. Bot seats
//! are driven by deferred mailbox messages, not by a separate scheduler.
//!
//! [`RoomManager`] owns the handles and routes players to rooms by code.

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod history;
mod manager;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use history::{LogHistory, MatchHistory, MatchResult};
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle, RoomInfo};
