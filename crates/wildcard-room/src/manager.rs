//! Routes players to rooms and owns the room handles.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use wildcard_game::BotRoster;
use wildcard_protocol::{ClientAction, PlayerId, RoomCode, SeatIndex};

use crate::room::spawn_room;
use crate::{
    MatchHistory, PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo,
};

const CODE_LEN: usize = 6;

/// Tracks every live room and which room each player sits in.
///
/// Not internally synchronized; the server wraps it in its own lock, the
/// same arrangement as the session ledger. The expensive work happens in
/// the room tasks, the manager only routes.
pub struct RoomManager<H: MatchHistory> {
    rooms: HashMap<RoomCode, RoomHandle>,
    /// One room per player, enforced on every join.
    player_rooms: HashMap<PlayerId, RoomCode>,
    config: RoomConfig,
    roster: Arc<BotRoster>,
    history: Arc<H>,
}

impl<H: MatchHistory> RoomManager<H> {
    pub fn new(config: RoomConfig, history: H) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            config,
            roster: Arc::new(BotRoster::new()),
            history: Arc::new(history),
        }
    }

    /// Creates a room with `creator` seated as its owner and returns the
    /// shareable code plus the owner's seat.
    pub async fn create_room(
        &mut self,
        creator: PlayerId,
        sender: PlayerSender,
    ) -> Result<(RoomCode, SeatIndex), RoomError> {
        if let Some(current) = self.player_rooms.get(&creator) {
            return Err(RoomError::AlreadyInRoom(creator, current.clone()));
        }

        let code = self.fresh_code();
        let handle = spawn_room(
            code.clone(),
            creator,
            self.config.clone(),
            Arc::clone(&self.roster),
            Arc::clone(&self.history),
        );
        let seat = handle.join(creator, sender).await?;

        self.rooms.insert(code.clone(), handle);
        self.player_rooms.insert(creator, code.clone());
        tracing::info!(room = %code, %creator, "room created");
        Ok((code, seat))
    }

    /// Seats a player in an existing room.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        code: &RoomCode,
        sender: PlayerSender,
    ) -> Result<SeatIndex, RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            // Rejoining the current room rebinds the event channel
            // (reconnect); any other room is off limits.
            if current != code {
                return Err(RoomError::AlreadyInRoom(
                    player_id,
                    current.clone(),
                ));
            }
        }
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let seat = handle.join(player_id, sender).await?;
        self.player_rooms.insert(player_id, code.clone());
        Ok(seat)
    }

    /// Re-registers a reconnecting player's event channel with the room
    /// they already sit in, returning their seat.
    pub async fn rebind(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<SeatIndex, RoomError> {
        let code = self
            .player_rooms
            .get(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        handle.join(player_id, sender).await
    }

    /// Removes a player from their current room. Waiting rooms only;
    /// seats are fixed once the deal happens.
    pub async fn leave_room(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        let code = self
            .player_rooms
            .get(&player_id)
            .cloned()
            .ok_or(RoomError::NotInRoom(player_id))?;

        if let Some(handle) = self.rooms.get(&code) {
            handle.leave(player_id).await?;
        }
        self.player_rooms.remove(&player_id);
        Ok(())
    }

    /// Resolves the handle of the room a player sits in. The clone stays
    /// valid on its own, so callers holding the manager behind a lock can
    /// release it before talking to the room mailbox.
    pub fn handle_for(
        &self,
        player_id: &PlayerId,
    ) -> Result<RoomHandle, RoomError> {
        let code = self
            .player_rooms
            .get(player_id)
            .ok_or(RoomError::NotInRoom(*player_id))?;
        self.rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Forwards a game action to the player's room.
    pub async fn route_action(
        &self,
        player_id: PlayerId,
        action: ClientAction,
    ) -> Result<(), RoomError> {
        self.handle_for(&player_id)?.action(player_id, action).await
    }

    pub async fn get_room_info(
        &self,
        code: &RoomCode,
    ) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        handle.get_info().await
    }

    /// Shuts the room task down and clears its members from the index.
    pub async fn destroy_room(
        &mut self,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, c| c != code);
        tracing::info!(room = %code, "room destroyed");
        Ok(())
    }

    pub fn player_room(&self, player_id: &PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(player_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// A random six-letter code not currently in use.
    fn fresh_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let code: String = (0..CODE_LEN)
                .map(|_| rng.random_range(b'A'..=b'Z') as char)
                .collect();
            let code = RoomCode::new(code);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}
