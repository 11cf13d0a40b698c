//! The authoritative room aggregate.
//!
//! `GameState` is the single source of truth for one game: seats, piles,
//! turn pointer, direction, pending penalty, phase. All mutation flows
//! through methods here or through [`crate::turn::apply`]; every other
//! component treats the state as read-only.

use rand::Rng;
use serde::{Deserialize, Serialize};
use wildcard_protocol::{
    Card, CardColor, Direction, GamePhase, PlayerId, Rank, RoomCode,
    SeatIndex,
};

use crate::bot::BotProfile;
use crate::{GameError, deck};

/// Table rules fixed at room creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rules {
    pub min_seats: usize,
    pub max_seats: usize,
    /// Cards dealt to each seat at start.
    pub hand_size: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            min_seats: 2,
            max_seats: 4,
            hand_size: 7,
        }
    }
}

/// Who holds a seat. Resolved once at join time; no runtime type
/// sniffing downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Occupant {
    Human(PlayerId),
    Bot(BotProfile),
}

impl Occupant {
    pub fn is_bot(&self) -> bool {
        matches!(self, Occupant::Bot(_))
    }

    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Occupant::Human(id) => Some(*id),
            Occupant::Bot(_) => None,
        }
    }
}

/// One fixed turn-order slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub occupant: Occupant,
    pub hand: Vec<Card>,
    pub declared_last_card: bool,
}

impl Seat {
    fn new(occupant: Occupant) -> Self {
        Self {
            occupant,
            hand: Vec::new(),
            declared_last_card: false,
        }
    }
}

/// The full authoritative state of one room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    code: RoomCode,
    rules: Rules,
    pub(crate) seats: Vec<Seat>,
    pub(crate) draw_pile: Vec<Card>,
    pub(crate) discard_pile: Vec<Card>,
    pub(crate) turn: usize,
    pub(crate) direction: Direction,
    pub(crate) pending_draw: u32,
    pub(crate) active_color: Option<CardColor>,
    pub(crate) phase: GamePhase,
    /// The card drawn by the current seat this turn, if any. Gates the
    /// draw-then-play policy: set by a non-forced draw, cleared whenever
    /// the turn pointer moves.
    pub(crate) drawn_card: Option<Card>,
}

impl GameState {
    /// Creates an empty waiting room.
    pub fn new(code: RoomCode, rules: Rules) -> Self {
        Self {
            code,
            rules,
            seats: Vec::new(),
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            turn: 0,
            direction: Direction::default(),
            pending_draw: 0,
            active_color: None,
            phase: GamePhase::Waiting,
            drawn_card: None,
        }
    }

    // -- Seat management (Waiting phase only) -----------------------------

    /// Seats a human player. Seat order is fixed at join time.
    pub fn add_human(
        &mut self,
        player: PlayerId,
    ) -> Result<SeatIndex, GameError> {
        self.ensure_joinable()?;
        if self.seat_of(player).is_some() {
            return Err(GameError::AlreadySeated(player));
        }
        self.seats.push(Seat::new(Occupant::Human(player)));
        Ok(SeatIndex(self.seats.len() - 1))
    }

    /// Seats a bot.
    pub fn add_bot(
        &mut self,
        profile: BotProfile,
    ) -> Result<SeatIndex, GameError> {
        self.ensure_joinable()?;
        self.seats.push(Seat::new(Occupant::Bot(profile)));
        Ok(SeatIndex(self.seats.len() - 1))
    }

    /// Removes a human seat. Only meaningful before the deal; once the
    /// game is active seats are fixed.
    pub fn remove_human(&mut self, player: PlayerId) -> Result<(), GameError> {
        if !self.phase.is_waiting() {
            return Err(GameError::NotWaiting);
        }
        let seat = self
            .seat_of(player)
            .ok_or(GameError::NotSeated(player))?;
        self.seats.remove(seat.0);
        Ok(())
    }

    fn ensure_joinable(&self) -> Result<(), GameError> {
        if !self.phase.is_waiting() {
            return Err(GameError::NotWaiting);
        }
        if self.seats.len() >= self.rules.max_seats {
            return Err(GameError::RoomFull);
        }
        Ok(())
    }

    // -- Lifecycle ---------------------------------------------------------

    /// Deals and begins the game.
    ///
    /// Shuffles a fresh deck, deals `hand_size` cards per seat, and seeds
    /// the discard pile. A WildDrawFour may not open the discard: such a
    /// card is buried at the bottom of the draw pile and the next card is
    /// taken instead. If the opener is a plain Wild, the active color is
    /// chosen uniformly at random (nobody declared one).
    pub fn start(&mut self, rng: &mut impl Rng) -> Result<(), GameError> {
        if !self.phase.is_waiting() {
            return Err(GameError::NotWaiting);
        }
        if self.seats.len() < self.rules.min_seats {
            return Err(GameError::NotEnoughSeats {
                have: self.seats.len(),
                need: self.rules.min_seats,
            });
        }

        let mut pile = deck::build();
        deck::shuffle(&mut pile, rng);

        for seat in &mut self.seats {
            seat.hand = pile.split_off(pile.len() - self.rules.hand_size);
            seat.declared_last_card = false;
        }

        // Seed the discard. The pile always holds enough non-WildDrawFour
        // cards for this loop to terminate.
        let top = loop {
            let card = pile.pop().expect("deck cannot be exhausted here");
            if card.rank != Rank::WildDrawFour {
                break card;
            }
            pile.insert(0, card);
        };

        self.active_color = Some(if top.color.is_base() {
            top.color
        } else {
            CardColor::BASE[rng.random_range(0..CardColor::BASE.len())]
        });
        self.discard_pile = vec![top];
        self.draw_pile = pile;
        self.turn = 0;
        self.direction = Direction::default();
        self.pending_draw = 0;
        self.drawn_card = None;
        self.phase = GamePhase::Active;

        self.check_invariants()
    }

    // -- Read access --------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn current_turn(&self) -> SeatIndex {
        SeatIndex(self.turn)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_draw(&self) -> u32 {
        self.pending_draw
    }

    pub fn active_color(&self) -> Option<CardColor> {
        self.active_color
    }

    pub fn top_discard(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn drawn_card(&self) -> Option<Card> {
        self.drawn_card
    }

    /// The seat a player occupies, if any.
    pub fn seat_of(&self, player: PlayerId) -> Option<SeatIndex> {
        self.seats
            .iter()
            .position(|s| s.occupant.player() == Some(player))
            .map(SeatIndex)
    }

    // -- Internal mutation helpers (turn engine only) ------------------------

    /// Moves the turn pointer `steps` places in the current direction
    /// and resets the per-turn draw marker.
    pub(crate) fn advance(&mut self, steps: usize) {
        let len = self.seats.len() as i64;
        let next =
            (self.turn as i64 + self.direction.step() * steps as i64)
                .rem_euclid(len);
        self.turn = next as usize;
        self.drawn_card = None;
    }

    /// Pops one card from the draw pile, reshuffling the discard (minus
    /// its top card) underneath when the pile runs dry. `None` means even
    /// the reshuffle could not produce a card, an invariant breach.
    pub(crate) fn take_from_draw_pile(
        &mut self,
        rng: &mut impl Rng,
    ) -> Option<Card> {
        if self.draw_pile.is_empty() {
            if self.discard_pile.len() <= 1 {
                return None;
            }
            let top = self.discard_pile.pop().expect("checked non-empty");
            self.draw_pile.append(&mut self.discard_pile);
            deck::shuffle(&mut self.draw_pile, rng);
            self.discard_pile.push(top);
            tracing::debug!(
                room = %self.code,
                recycled = self.draw_pile.len(),
                "reshuffled discard into draw pile"
            );
        }
        self.draw_pile.pop()
    }

    /// Adds cards to a hand. Receiving a card always revokes a standing
    /// last-card declaration.
    pub(crate) fn give_cards(&mut self, seat: usize, cards: Vec<Card>) {
        let seat = &mut self.seats[seat];
        seat.hand.extend(cards);
        seat.declared_last_card = false;
    }

    // -- Invariants ----------------------------------------------------------

    /// Verifies the aggregate invariants. A failure is a defect in the
    /// engine, never a user error; callers must treat it as fatal for
    /// the room.
    pub fn check_invariants(&self) -> Result<(), GameError> {
        if self.phase.is_waiting() {
            return Ok(());
        }

        let in_hands: usize =
            self.seats.iter().map(|s| s.hand.len()).sum();
        let total =
            self.draw_pile.len() + self.discard_pile.len() + in_hands;
        if total != deck::DECK_SIZE {
            return Err(GameError::InvariantViolation(format!(
                "card conservation broken: {total} cards in play, expected {}",
                deck::DECK_SIZE
            )));
        }

        if self.turn >= self.seats.len() {
            return Err(GameError::InvariantViolation(format!(
                "turn pointer {} out of range for {} seats",
                self.turn,
                self.seats.len()
            )));
        }

        for (i, seat) in self.seats.iter().enumerate() {
            if seat.declared_last_card && seat.hand.len() != 1 {
                return Err(GameError::InvariantViolation(format!(
                    "seat {i} declared last card with {} cards in hand",
                    seat.hand.len()
                )));
            }
        }

        let empty_hands =
            self.seats.iter().filter(|s| s.hand.is_empty()).count();
        match self.phase {
            GamePhase::Active => {
                if self.discard_pile.is_empty() {
                    return Err(GameError::InvariantViolation(
                        "discard pile empty while active".into(),
                    ));
                }
                match self.active_color {
                    Some(c) if c.is_base() => {}
                    other => {
                        return Err(GameError::InvariantViolation(format!(
                            "active color must be a base color, got {other:?}"
                        )));
                    }
                }
                if empty_hands != 0 {
                    return Err(GameError::InvariantViolation(
                        "empty hand while game still active".into(),
                    ));
                }
            }
            GamePhase::Finished { winner } => {
                if empty_hands != 1
                    || !self.seats[winner.0].hand.is_empty()
                {
                    return Err(GameError::InvariantViolation(
                        "finished game must have exactly the winner's hand empty"
                            .into(),
                    ));
                }
            }
            GamePhase::Waiting => unreachable!("handled above"),
        }

        Ok(())
    }
}
