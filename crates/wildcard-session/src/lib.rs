//! Player identity and connection lifecycle.
//!
//! The server calls into this crate twice per connection: once during
//! the handshake to turn a credential into a `PlayerId` (via the
//! embedder-supplied [`Authenticator`]) and once per connect/disconnect
//! to keep the [`SessionManager`] ledger current. A short grace period
//! lets a dropped client resume its session with a reconnect token
//! instead of authenticating again.

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod manager;
mod session;

pub use auth::Authenticator;
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig, SessionState};
