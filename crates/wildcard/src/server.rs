//! Server assembly and accept loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use wildcard_protocol::{Codec, JsonCodec};
use wildcard_room::{MatchHistory, RoomConfig, RoomManager};
use wildcard_session::{Authenticator, SessionConfig, SessionManager};
use wildcard_transport::{Transport, WebSocketTransport};

use crate::WildcardError;
use crate::handler::handle_connection;

/// Wire protocol version; handshakes carrying anything else are refused.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared state handed to every connection task.
///
/// The managers sit behind Tokio mutexes; handlers hold a lock only for
/// the manager call itself, never across client I/O. The real work runs
/// inside the room tasks.
pub(crate) struct ServerState<H: MatchHistory, A: Authenticator, C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) rooms: Mutex<RoomManager<H>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Configures and builds a [`WildcardServer`].
pub struct WildcardServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    room_config: RoomConfig,
}

impl WildcardServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
            room_config: RoomConfig::default(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener and assembles the server with the JSON codec
    /// over WebSocket.
    pub async fn build<A, H>(
        self,
        auth: A,
        history: H,
    ) -> Result<WildcardServer<H, A, JsonCodec>, WildcardError>
    where
        A: Authenticator,
        H: MatchHistory,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            rooms: Mutex::new(RoomManager::new(self.room_config, history)),
            auth,
            codec: JsonCodec,
        });

        Ok(WildcardServer { transport, state })
    }
}

impl Default for WildcardServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server; [`run`](Self::run) drives it forever.
pub struct WildcardServer<H: MatchHistory, A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<H, A, C>>,
}

impl<H, A, C> WildcardServer<H, A, C>
where
    H: MatchHistory,
    A: Authenticator,
    C: Codec + Send + Sync + 'static,
{
    /// The bound address; the way to learn the port after binding to 0.
    pub fn local_addr(
        &self,
    ) -> Result<std::net::SocketAddr, WildcardError> {
        Ok(self.transport.local_addr()?)
    }

    /// Accepts connections until the process dies. Each connection gets
    /// its own handler task.
    pub async fn run(mut self) -> Result<(), WildcardError> {
        tracing::info!("wildcard server running");

        tokio::spawn(sweep_sessions(Arc::clone(&self.state)));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Periodic sweep: expire sessions past their reconnect grace and free
/// any undealt seats they still hold.
async fn sweep_sessions<H, A, C>(state: Arc<ServerState<H, A, C>>)
where
    H: MatchHistory,
    A: Authenticator,
    C: Codec,
{
    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    loop {
        ticker.tick().await;

        let expired = {
            let mut sessions = state.sessions.lock().await;
            let expired = sessions.expire_stale();
            sessions.cleanup_expired();
            expired
        };

        for player_id in expired {
            let mut rooms = state.rooms.lock().await;
            let Some(code) = rooms.player_room(&player_id).cloned() else {
                continue;
            };
            let waiting = match rooms.get_room_info(&code).await {
                Ok(info) => info.phase.is_waiting(),
                Err(_) => false,
            };
            if waiting {
                let _ = rooms.leave_room(player_id).await;
            }
        }
    }
}
