//! A runnable card table.
//!
//! ```text
//! cargo run -p card-table [addr]
//! ```
//!
//! Connect any WebSocket client to `ws://127.0.0.1:8080`, handshake
//! with a numeric token ("1", "2", ...), create a room, add bots, and
//! play. `RUST_LOG=debug` shows every rejection and room transition.

use tracing_subscriber::EnvFilter;
use wildcard::{WildcardError, WildcardServerBuilder};
use wildcard_protocol::PlayerId;
use wildcard_room::LogHistory;
use wildcard_session::{Authenticator, SessionError};

/// Development-only authenticator: the token is the player id in
/// decimal. Do not ship this.
struct DevAuth;

impl Authenticator for DevAuth {
    async fn authenticate(
        &self,
        token: &str,
    ) -> Result<PlayerId, SessionError> {
        token.parse().map(PlayerId).map_err(|_| {
            SessionError::AuthFailed("token must be a number".into())
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), WildcardError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let server = WildcardServerBuilder::new()
        .bind(&addr)
        .build(DevAuth, LogHistory)
        .await?;
    tracing::info!(%addr, "card table open");
    server.run().await
}
