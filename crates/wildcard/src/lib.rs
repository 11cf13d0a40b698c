//! # Wildcard
//!
//! An authoritative server for a shedding-style card game: players (and
//! bots) share four-seat rooms, the server owns every deck and hand, and
//! clients only ever see a per-seat projection of the table.
//!
//! The stack, bottom to top:
//!
//! - `wildcard-protocol`: wire envelopes, cards, actions, views
//! - `wildcard-game`: the pure rules engine
//! - `wildcard-session`: identity and reconnectable sessions
//! - `wildcard-room`: one actor task per table
//! - `wildcard-transport`: WebSocket byte transport
//!
//! This crate ties them together behind [`WildcardServer`]:
//!
//! ```rust,no_run
//! use wildcard::WildcardServerBuilder;
//! use wildcard_room::LogHistory;
//! # use wildcard_protocol::PlayerId;
//! # use wildcard_session::{Authenticator, SessionError};
//! # struct DevAuth;
//! # impl Authenticator for DevAuth {
//! #     async fn authenticate(&self, token: &str) -> Result<PlayerId, SessionError> {
//! #         Ok(PlayerId(token.parse().unwrap_or(0)))
//! #     }
//! # }
//!
//! # async fn run() -> Result<(), wildcard::WildcardError> {
//! let server = WildcardServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(DevAuth, LogHistory)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::WildcardError;
pub use server::{PROTOCOL_VERSION, WildcardServer, WildcardServerBuilder};
