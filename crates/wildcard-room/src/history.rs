//! Finished-match reporting.
//!
//! Same seam pattern as the session layer's authenticator: the embedder
//! implements [`MatchHistory`] (database insert, stats service call) and
//! the room task fires a record at it when a game ends. Recording is
//! fire-and-forget; a slow sink never blocks the room.

use wildcard_protocol::{RoomCode, SeatIndex};

/// Outcome of one completed game.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub code: RoomCode,
    pub winner: SeatIndex,
    /// Display form of the winning occupant ("P-7" or a bot name).
    pub winner_name: String,
    pub seats: usize,
}

/// Receives finished-match results.
pub trait MatchHistory: Send + Sync + 'static {
    fn record(
        &self,
        result: MatchResult,
    ) -> impl std::future::Future<Output = ()> + Send;
}

/// Default sink: one structured log line per finished game.
#[derive(Debug, Default)]
pub struct LogHistory;

impl MatchHistory for LogHistory {
    async fn record(&self, result: MatchResult) {
        tracing::info!(
            room = %result.code,
            winner = %result.winner,
            winner_name = %result.winner_name,
            seats = result.seats,
            "match finished"
        );
    }
}
