//! The room actor: one Tokio task owning one table.
//!
//! The mailbox serializes everything. A command is handled to
//! completion, including pushing every resulting broadcast into the
//! per-player channels, before the next command is read; clients
//! therefore observe transitions in a single room-wide order.
//!
//! Bot seats act through the same mailbox: after a transition that
//! leaves a bot on turn, the actor spawns a sleep task that posts a
//! `BotTurn` command back. The command carries the transition serial it
//! was scheduled under and is dropped if the room moved on in the
//! meantime.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, oneshot};
use wildcard_game::{BotMove, BotRoster, GameState, bot, turn, view};
use wildcard_protocol::{
    ClientAction, GamePhase, PlayerId, RoomCode, SeatIndex, ServerEvent,
};

use crate::{MatchHistory, MatchResult, RoomConfig, RoomError};

/// Outbound channel into one player's connection handler. Unbounded so
/// the room task never blocks on a slow client.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<SeatIndex, RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Action {
        player_id: PlayerId,
        action: ClientAction,
    },
    /// Deferred bot move. `serial` pins the transition it was scheduled
    /// after; a stale serial means the move was superseded.
    BotTurn { seat: SeatIndex, serial: u64 },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// Room metadata snapshot, without any hand information.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: GamePhase,
    pub seats: usize,
    pub max_seats: usize,
}

/// Cheap-to-clone handle to a running room task.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Seats a player and registers their event channel.
    pub async fn join(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<SeatIndex, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                sender,
                reply,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        rx.await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave { player_id, reply })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        rx.await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Submits a game action. Fire-and-forget: validation results come
    /// back on the player's event channel.
    pub async fn action(
        &self,
        player_id: PlayerId,
        action: ClientAction,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Action { player_id, action })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        rx.await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

struct RoomActor<H: MatchHistory> {
    state: GameState,
    creator: PlayerId,
    config: RoomConfig,
    senders: HashMap<PlayerId, PlayerSender>,
    roster: Arc<BotRoster>,
    history: Arc<H>,
    rng: StdRng,
    /// Bumped on every state transition; stale `BotTurn` commands carry
    /// an older value and are ignored.
    serial: u64,
    /// Set when the engine reports an invariant breach. The room stays
    /// readable but rejects every further mutation.
    corrupt: bool,
    mailbox: mpsc::Sender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<H: MatchHistory> RoomActor<H> {
    async fn run(mut self) {
        tracing::info!(room = %self.state.code(), "room task started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    sender,
                    reply,
                } => {
                    let _ = reply.send(self.handle_join(player_id, sender));
                }
                RoomCommand::Leave { player_id, reply } => {
                    let _ = reply.send(self.handle_leave(player_id));
                }
                RoomCommand::Action { player_id, action } => {
                    self.handle_action(player_id, action);
                }
                RoomCommand::BotTurn { seat, serial } => {
                    self.handle_bot_turn(seat, serial);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(
                        room = %self.state.code(),
                        "room shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!(room = %self.state.code(), "room task stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<SeatIndex, RoomError> {
        if self.corrupt {
            return Err(RoomError::Corrupt(self.state.code().clone()));
        }
        // A player rejoining their own seat (reconnect) just swaps the
        // event channel and gets a fresh snapshot.
        if let Some(seat) = self.state.seat_of(player_id) {
            self.senders.insert(player_id, sender);
            tracing::info!(
                room = %self.state.code(),
                %player_id,
                %seat,
                "player rebound to seat"
            );
            self.broadcast();
            return Ok(seat);
        }
        let seat = self.state.add_human(player_id)?;
        self.senders.insert(player_id, sender);
        tracing::info!(
            room = %self.state.code(),
            %player_id,
            %seat,
            "player seated"
        );
        self.broadcast();
        Ok(seat)
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        self.state.remove_human(player_id)?;
        self.senders.remove(&player_id);
        tracing::info!(
            room = %self.state.code(),
            %player_id,
            "player left"
        );
        self.broadcast();
        Ok(())
    }

    fn handle_action(&mut self, player_id: PlayerId, action: ClientAction) {
        if self.corrupt {
            self.reject(player_id, "room is out of service".into());
            return;
        }

        let seat = match self.state.seat_of(player_id) {
            Some(seat) => seat,
            None => {
                self.reject(player_id, "you are not seated here".into());
                return;
            }
        };

        match action {
            ClientAction::StartGame => {
                if player_id != self.creator {
                    self.reject(
                        player_id,
                        "only the room owner can start the game".into(),
                    );
                    return;
                }
                match self.state.start(&mut self.rng) {
                    Ok(()) => self.after_transition(),
                    Err(e) => self.reject(player_id, e.to_string()),
                }
            }
            ClientAction::AddBot => {
                if player_id != self.creator {
                    self.reject(
                        player_id,
                        "only the room owner can add bots".into(),
                    );
                    return;
                }
                match self.state.add_bot(self.roster.next_profile()) {
                    Ok(_) => self.after_transition(),
                    Err(e) => self.reject(player_id, e.to_string()),
                }
            }
            other => {
                let action = match map_action(other) {
                    Some(a) => a,
                    None => return,
                };
                self.apply_turn(player_id, seat, &action);
            }
        }
    }

    fn handle_bot_turn(&mut self, seat: SeatIndex, serial: u64) {
        if self.corrupt
            || serial != self.serial
            || !self.state.phase().is_active()
            || self.state.current_turn() != seat
        {
            // Superseded while the think delay ran.
            return;
        }

        let action = match bot::decide(&self.state, seat) {
            BotMove::Play {
                card,
                declared_color,
            } => turn::Action::PlayCard {
                card,
                declared_color,
            },
            BotMove::Draw => turn::Action::DrawCard,
        };

        match turn::apply(&mut self.state, seat, &action, &mut self.rng) {
            Ok(()) => self.after_transition(),
            Err(e) => {
                // A bad policy move must not wedge the turn; degrade to
                // the fallback and only give up if that is rejected too.
                tracing::warn!(
                    room = %self.state.code(),
                    %seat,
                    error = %e,
                    "bot move rejected, falling back"
                );
                let fallback = bot_fallback(&self.state);
                match turn::apply(
                    &mut self.state,
                    seat,
                    &fallback,
                    &mut self.rng,
                ) {
                    Ok(()) => self.after_transition(),
                    Err(e) => {
                        tracing::error!(
                            room = %self.state.code(),
                            %seat,
                            error = %e,
                            "bot fallback rejected"
                        );
                        self.mark_corrupt();
                    }
                }
            }
        }
    }

    fn apply_turn(
        &mut self,
        player_id: PlayerId,
        seat: SeatIndex,
        action: &turn::Action,
    ) {
        match turn::apply(&mut self.state, seat, action, &mut self.rng) {
            Ok(()) => self.after_transition(),
            Err(turn::TurnError::DeckExhausted) => {
                tracing::error!(
                    room = %self.state.code(),
                    "draw pile exhausted past reshuffle"
                );
                self.mark_corrupt();
                self.reject(player_id, "room is out of service".into());
            }
            Err(e) => self.reject(player_id, e.to_string()),
        }
    }

    /// Common tail of every successful mutation: bump the serial, verify
    /// the engine invariants, broadcast, then hand off to history or the
    /// bot scheduler.
    fn after_transition(&mut self) {
        self.serial += 1;

        if let Err(e) = self.state.check_invariants() {
            tracing::error!(
                room = %self.state.code(),
                error = %e,
                "invariant breach after transition"
            );
            self.mark_corrupt();
            return;
        }

        self.broadcast();

        match self.state.phase() {
            GamePhase::Finished { winner } => self.finish(winner),
            GamePhase::Active => self.schedule_bot_turn(),
            GamePhase::Waiting => {}
        }
    }

    fn finish(&mut self, winner: SeatIndex) {
        self.broadcast_event(ServerEvent::GameEnded { winner });

        let occupant = &self.state.seats()[winner.0].occupant;
        let winner_name = match occupant {
            wildcard_game::Occupant::Human(p) => p.to_string(),
            wildcard_game::Occupant::Bot(b) => b.name.clone(),
        };
        let result = MatchResult {
            code: self.state.code().clone(),
            winner,
            winner_name,
            seats: self.state.seats().len(),
        };
        let history = Arc::clone(&self.history);
        tokio::spawn(async move {
            history.record(result).await;
        });
    }

    /// If a bot holds the turn, post a delayed `BotTurn` back to the
    /// mailbox.
    fn schedule_bot_turn(&mut self) {
        let seat = self.state.current_turn();
        if !self.state.seats()[seat.0].occupant.is_bot() {
            return;
        }

        let min = self.config.bot_delay_min.as_millis() as u64;
        let max = self.config.bot_delay_max.as_millis() as u64;
        let delay_ms = if min >= max {
            min
        } else {
            self.rng.random_range(min..=max)
        };

        let serial = self.serial;
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms))
                .await;
            let _ = mailbox.send(RoomCommand::BotTurn { seat, serial }).await;
        });
    }

    fn mark_corrupt(&mut self) {
        self.corrupt = true;
        self.broadcast_event(ServerEvent::ActionRejected {
            reason: "room is out of service".into(),
        });
    }

    /// Pushes a fresh per-recipient projection to every connected player.
    fn broadcast(&self) {
        for (player_id, sender) in &self.senders {
            let recipient = self.state.seat_of(*player_id);
            let event = ServerEvent::RoomUpdate {
                view: view::project(&self.state, recipient),
            };
            let _ = sender.send(event);
        }
    }

    fn broadcast_event(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Sends a rejection to one player only.
    fn reject(&self, player_id: PlayerId, reason: String) {
        tracing::debug!(
            room = %self.state.code(),
            %player_id,
            %reason,
            "action rejected"
        );
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(ServerEvent::ActionRejected { reason });
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.state.code().clone(),
            phase: self.state.phase(),
            seats: self.state.seats().len(),
            max_seats: self.state.rules().max_seats,
        }
    }
}

/// The always-legal move for a bot seat that holds the turn: pass once a
/// draw already happened this turn, otherwise draw.
fn bot_fallback(state: &GameState) -> turn::Action {
    if state.drawn_card().is_some() {
        turn::Action::PassTurn
    } else {
        turn::Action::DrawCard
    }
}

/// Translates wire actions into engine actions. `StartGame` and `AddBot`
/// are room-level and handled before this point.
fn map_action(action: ClientAction) -> Option<turn::Action> {
    match action {
        ClientAction::PlayCard {
            card,
            declared_color,
        } => Some(turn::Action::PlayCard {
            card,
            declared_color,
        }),
        ClientAction::DrawCard => Some(turn::Action::DrawCard),
        ClientAction::PassTurn => Some(turn::Action::PassTurn),
        ClientAction::DeclareLastCard => Some(turn::Action::DeclareLastCard),
        ClientAction::ChallengeLastCard { seat } => {
            Some(turn::Action::ChallengeLastCard { target: seat })
        }
        ClientAction::StartGame | ClientAction::AddBot => None,
    }
}

/// Spawns the room task and returns its handle.
pub(crate) fn spawn_room<H: MatchHistory>(
    code: RoomCode,
    creator: PlayerId,
    config: RoomConfig,
    roster: Arc<BotRoster>,
    history: Arc<H>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let actor = RoomActor {
        state: GameState::new(code.clone(), config.rules),
        creator,
        config,
        senders: HashMap::new(),
        roster,
        history,
        rng: StdRng::from_os_rng(),
        serial: 0,
        corrupt: false,
        mailbox: tx.clone(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
