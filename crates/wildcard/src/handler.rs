//! Per-connection lifecycle: handshake, session bookkeeping, and the
//! message loop.
//!
//! Each accepted socket gets one handler task and one pump task. The
//! handler stays parked on `recv` and dispatches inbound frames; the
//! pump drains the player's room-event channel and frames events onto
//! the socket. The two share the connection handle and a sequence
//! counter, nothing else.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use wildcard_protocol::{
    Codec, Envelope, Payload, PlayerId, ProtocolError, ServerEvent,
    SystemMessage,
};
use wildcard_room::{MatchHistory, RoomError};
use wildcard_session::{Authenticator, SessionError};
use wildcard_transport::{Connection, WebSocketConnection};

use crate::WildcardError;
use crate::server::{PROTOCOL_VERSION, ServerState};

/// How long a fresh socket gets to produce its handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle cutoff for established connections. Clients that want to sit
/// quietly send heartbeats.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Drives one connection from handshake to close.
pub(crate) async fn handle_connection<H, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<H, A, C>>,
) -> Result<(), WildcardError>
where
    H: MatchHistory,
    A: Authenticator,
    C: Codec,
{
    let seq = Arc::new(AtomicU64::new(1));

    let player_id = match handshake(&conn, &state, &seq).await {
        Ok(id) => id,
        Err(e) => {
            let _ = conn.close().await;
            return Err(e);
        }
    };
    tracing::info!(conn = %conn.id(), %player_id, "player online");

    // Marks the session disconnected (and frees an undealt seat) no
    // matter how the handler exits.
    let _guard = SessionGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel();

    // A reconnecting player may still hold a seat; swap their event
    // channel in and remind them where they sit.
    let rebound = {
        let rooms = state.rooms.lock().await;
        match rooms.player_room(&player_id).cloned() {
            Some(code) => match rooms.rebind(player_id, event_tx.clone()).await
            {
                Ok(seat) => Some((code, seat)),
                Err(e) => {
                    tracing::warn!(
                        %player_id,
                        error = %e,
                        "seat rebind failed"
                    );
                    None
                }
            },
            None => None,
        }
    };
    if let Some((code, seat)) = rebound {
        send_system(
            &conn,
            &state.codec,
            &seq,
            SystemMessage::RoomJoined { code, seat },
        )
        .await?;
    }

    let pump = tokio::spawn(pump_events(
        conn.clone(),
        Arc::clone(&state),
        Arc::clone(&seq),
        event_rx,
    ));

    let result = drive(&conn, &state, player_id, &event_tx, &seq).await;

    pump.abort();
    let _ = conn.close().await;
    result
}

/// The post-handshake message loop. Returns `Ok` on an orderly close.
async fn drive<H, A, C>(
    conn: &WebSocketConnection,
    state: &ServerState<H, A, C>,
    player_id: PlayerId,
    event_tx: &mpsc::UnboundedSender<ServerEvent>,
    seq: &AtomicU64,
) -> Result<(), WildcardError>
where
    H: MatchHistory,
    A: Authenticator,
    C: Codec,
{
    loop {
        let raw = match timeout(IDLE_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(bytes))) => bytes,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed by peer");
                return Ok(());
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                tracing::info!(%player_id, "connection idle, dropping");
                return Ok(());
            }
        };

        let envelope: Envelope = match state.codec.decode(&raw) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "undecodable frame");
                send_error(conn, &state.codec, seq, 400, "malformed message")
                    .await?;
                continue;
            }
        };

        match envelope.payload {
            Payload::System(msg) => {
                let done = handle_system(
                    conn, state, player_id, event_tx, seq, msg,
                )
                .await?;
                if done {
                    return Ok(());
                }
            }
            Payload::Action(action) => {
                // Resolve the handle under the lock, send outside it; a
                // backed-up room mailbox must not stall routing for
                // every other room.
                let handle =
                    state.rooms.lock().await.handle_for(&player_id);
                let result = match handle {
                    Ok(handle) => handle.action(player_id, action).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    send_error(
                        conn,
                        &state.codec,
                        seq,
                        room_error_code(&e),
                        &e.to_string(),
                    )
                    .await?;
                }
            }
            Payload::Event(_) => {
                tracing::debug!(
                    %player_id,
                    "client sent a server event, ignoring"
                );
            }
        }
    }
}

/// Handles one system message. `Ok(true)` ends the connection.
async fn handle_system<H, A, C>(
    conn: &WebSocketConnection,
    state: &ServerState<H, A, C>,
    player_id: PlayerId,
    event_tx: &mpsc::UnboundedSender<ServerEvent>,
    seq: &AtomicU64,
    msg: SystemMessage,
) -> Result<bool, WildcardError>
where
    H: MatchHistory,
    A: Authenticator,
    C: Codec,
{
    match msg {
        SystemMessage::Heartbeat { client_time } => {
            send_system(
                conn,
                &state.codec,
                seq,
                SystemMessage::HeartbeatAck { client_time },
            )
            .await?;
        }
        SystemMessage::CreateRoom => {
            let result = state
                .rooms
                .lock()
                .await
                .create_room(player_id, event_tx.clone())
                .await;
            match result {
                Ok((code, seat)) => {
                    send_system(
                        conn,
                        &state.codec,
                        seq,
                        SystemMessage::RoomJoined { code, seat },
                    )
                    .await?;
                }
                Err(e) => {
                    send_error(
                        conn,
                        &state.codec,
                        seq,
                        room_error_code(&e),
                        &e.to_string(),
                    )
                    .await?;
                }
            }
        }
        SystemMessage::JoinRoom { code } => {
            let result = state
                .rooms
                .lock()
                .await
                .join_room(player_id, &code, event_tx.clone())
                .await;
            match result {
                Ok(seat) => {
                    send_system(
                        conn,
                        &state.codec,
                        seq,
                        SystemMessage::RoomJoined { code, seat },
                    )
                    .await?;
                }
                Err(e) => {
                    send_error(
                        conn,
                        &state.codec,
                        seq,
                        room_error_code(&e),
                        &e.to_string(),
                    )
                    .await?;
                }
            }
        }
        SystemMessage::LeaveRoom => {
            let result =
                state.rooms.lock().await.leave_room(player_id).await;
            if let Err(e) = result {
                send_error(
                    conn,
                    &state.codec,
                    seq,
                    room_error_code(&e),
                    &e.to_string(),
                )
                .await?;
            }
        }
        SystemMessage::Disconnect { reason } => {
            tracing::info!(%player_id, %reason, "client disconnecting");
            return Ok(true);
        }
        other => {
            tracing::debug!(
                %player_id,
                ?other,
                "unexpected system message"
            );
        }
    }
    Ok(false)
}

/// Reads and validates the handshake, establishing a session.
///
/// The credential field does double duty: if it matches a live reconnect
/// token the old session resumes, otherwise it goes to the embedder's
/// authenticator as a login credential.
async fn handshake<H, A, C>(
    conn: &WebSocketConnection,
    state: &ServerState<H, A, C>,
    seq: &AtomicU64,
) -> Result<PlayerId, WildcardError>
where
    H: MatchHistory,
    A: Authenticator,
    C: Codec,
{
    let raw = match timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(bytes))) => bytes,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage(
                "handshake timed out".into(),
            )
            .into());
        }
    };

    let envelope: Envelope = state.codec.decode(&raw)?;
    let (version, token) = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version, token }) => {
            (version, token)
        }
        _ => {
            send_error(conn, &state.codec, seq, 400, "expected a handshake")
                .await?;
            return Err(ProtocolError::InvalidMessage(
                "first message was not a handshake".into(),
            )
            .into());
        }
    };

    if version != PROTOCOL_VERSION {
        let message = format!("unsupported protocol version {version}");
        send_error(conn, &state.codec, seq, 400, &message).await?;
        return Err(ProtocolError::InvalidMessage(message).into());
    }

    let (player_id, reconnect_token) =
        match establish_session(state, &token).await {
            Ok(ok) => ok,
            Err((code, e)) => {
                send_error(conn, &state.codec, seq, code, &e.to_string())
                    .await?;
                return Err(e);
            }
        };

    send_system(
        conn,
        &state.codec,
        seq,
        SystemMessage::HandshakeAck {
            player_id,
            reconnect_token,
        },
    )
    .await?;

    Ok(player_id)
}

/// Resumes or creates the session for a handshake credential. On failure
/// returns the wire error code alongside the error.
async fn establish_session<H, A, C>(
    state: &ServerState<H, A, C>,
    token: &str,
) -> Result<(PlayerId, String), (u16, WildcardError)>
where
    H: MatchHistory,
    A: Authenticator,
    C: Codec,
{
    {
        let mut sessions = state.sessions.lock().await;
        match sessions.reconnect(token) {
            Ok(session) => {
                return Ok((
                    session.player_id,
                    session.reconnect_token.clone(),
                ));
            }
            // Not a reconnect token, treat it as a login credential.
            Err(SessionError::InvalidToken) => {}
            Err(e) => return Err((409, e.into())),
        }
    }

    let player_id = state
        .auth
        .authenticate(token)
        .await
        .map_err(|e| (401, e.into()))?;

    let mut sessions = state.sessions.lock().await;
    match sessions.create(player_id) {
        Ok(session) => {
            Ok((session.player_id, session.reconnect_token.clone()))
        }
        Err(e) => Err((409, e.into())),
    }
}

/// Frames room events onto the socket until the channel or socket dies.
async fn pump_events<H, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<H, A, C>>,
    seq: Arc<AtomicU64>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
) where
    H: MatchHistory,
    A: Authenticator,
    C: Codec,
{
    while let Some(event) = events.recv().await {
        let envelope = Envelope {
            seq: seq.fetch_add(1, Ordering::Relaxed),
            payload: Payload::Event(event),
        };
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "event encode failed");
                continue;
            }
        };
        if conn.send(&bytes).await.is_err() {
            break;
        }
    }
}

/// Runs disconnect bookkeeping when the handler exits, panics included.
struct SessionGuard<H: MatchHistory, A: Authenticator, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<H, A, C>>,
}

impl<H, A, C> Drop for SessionGuard<H, A, C>
where
    H: MatchHistory,
    A: Authenticator,
    C: Codec,
{
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            if let Err(e) =
                state.sessions.lock().await.disconnect(player_id)
            {
                tracing::debug!(
                    %player_id,
                    error = %e,
                    "disconnect bookkeeping failed"
                );
            }

            // Free the seat right away if the room has not dealt yet.
            // Mid-game seats stay reserved for the reconnect grace
            // period.
            let mut rooms = state.rooms.lock().await;
            let code = match rooms.player_room(&player_id).cloned() {
                Some(code) => code,
                None => return,
            };
            let waiting = match rooms.get_room_info(&code).await {
                Ok(info) => info.phase.is_waiting(),
                Err(_) => false,
            };
            if waiting {
                if let Err(e) = rooms.leave_room(player_id).await {
                    tracing::debug!(
                        %player_id,
                        error = %e,
                        "leave on disconnect failed"
                    );
                }
            }
        });
    }
}

async fn send_system<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    seq: &AtomicU64,
    msg: SystemMessage,
) -> Result<(), WildcardError> {
    let envelope = Envelope {
        seq: seq.fetch_add(1, Ordering::Relaxed),
        payload: Payload::System(msg),
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

async fn send_error<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    seq: &AtomicU64,
    code: u16,
    message: &str,
) -> Result<(), WildcardError> {
    send_system(
        conn,
        codec,
        seq,
        SystemMessage::Error {
            code,
            message: message.to_string(),
        },
    )
    .await
}

/// Maps room failures to wire error codes (HTTP conventions).
fn room_error_code(err: &RoomError) -> u16 {
    match err {
        RoomError::NotFound(_) => 404,
        RoomError::AlreadyInRoom(..)
        | RoomError::Unavailable(_)
        | RoomError::Corrupt(_)
        | RoomError::Game(_) => 409,
        RoomError::NotInRoom(_) => 400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wildcard_protocol::RoomCode;

    #[test]
    fn test_room_error_codes_follow_http_conventions() {
        let code = RoomCode::new("ABCDEF");
        assert_eq!(
            room_error_code(&RoomError::NotFound(code.clone())),
            404
        );
        assert_eq!(
            room_error_code(&RoomError::AlreadyInRoom(
                PlayerId(1),
                code.clone()
            )),
            409
        );
        assert_eq!(room_error_code(&RoomError::NotInRoom(PlayerId(1))), 400);
        assert_eq!(room_error_code(&RoomError::Corrupt(code)), 409);
    }
}
