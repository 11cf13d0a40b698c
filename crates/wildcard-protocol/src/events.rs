//! Game traffic: client actions, server events, and the per-recipient
//! room projection.

use serde::{Deserialize, Serialize};

use crate::{Card, CardColor, PlayerId, RoomCode, SeatIndex};

/// Rotation direction of the turn pointer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
pub enum Direction {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Signed step applied to the turn pointer per advance.
    pub fn step(self) -> i64 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

/// Lifecycle of a game room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum GamePhase {
    /// Seats are still being filled; no cards dealt.
    Waiting,
    /// Cards dealt, turns in progress.
    Active,
    /// Terminal. No further mutation, read access only.
    Finished { winner: SeatIndex },
}

impl GamePhase {
    pub fn is_active(self) -> bool {
        matches!(self, GamePhase::Active)
    }

    pub fn is_waiting(self) -> bool {
        matches!(self, GamePhase::Waiting)
    }
}

/// Game actions a client can submit once seated.
///
/// Bot seats submit the same vocabulary through the same validation
/// path; there is no privileged bot interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientAction {
    /// Deal and begin. Room owner only, two or more seats required.
    StartGame,

    /// Seat a scripted player. Room owner only, waiting rooms only.
    AddBot,

    /// Play `card` from the hand. Wild-family cards must carry a
    /// `declared_color` naming one of the four base colors.
    PlayCard {
        card: Card,
        declared_color: Option<CardColor>,
    },

    /// Draw from the pile: the full pending penalty if one is stacked,
    /// otherwise a single card.
    DrawCard,

    /// End the turn after a non-forced draw whose card was playable.
    PassTurn,

    /// Announce being down to the last card.
    DeclareLastCard,

    /// Accuse `seat` of sitting on an undeclared last card.
    ChallengeLastCard { seat: SeatIndex },
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A fresh projection of the room, personalized per recipient.
    RoomUpdate { view: RoomView },

    /// The game reached its terminal state.
    GameEnded { winner: SeatIndex },

    /// The recipient's last action was rejected. Sent only to the actor;
    /// nothing was broadcast and no state changed.
    ActionRejected { reason: String },
}

/// Who occupies a seat, as visible to every participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SeatOccupant {
    Human { player: PlayerId },
    Bot { name: String },
}

/// A seat's cards as one specific recipient is allowed to see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "visibility")]
pub enum CardsView {
    /// Someone else's hand: count only.
    Hidden { count: usize },
    /// The recipient's own hand.
    Visible { cards: Vec<Card> },
}

impl CardsView {
    pub fn count(&self) -> usize {
        match self {
            CardsView::Hidden { count } => *count,
            CardsView::Visible { cards } => cards.len(),
        }
    }
}

/// One seat as projected for a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub occupant: SeatOccupant,
    pub cards: CardsView,
    pub declared_last_card: bool,
}

/// A recipient-specific snapshot of a room.
///
/// Exactly one seat may carry [`CardsView::Visible`]: the recipient's
/// own. Everything else is shared state copied verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    pub code: RoomCode,
    pub seats: Vec<SeatView>,
    pub phase: GamePhase,
    pub turn: SeatIndex,
    pub direction: Direction,
    /// Top of the discard pile; `None` until the game starts.
    pub top_discard: Option<Card>,
    /// The color the next play must match. `None` until the game starts.
    pub active_color: Option<CardColor>,
    pub pending_draw: u32,
    pub draw_pile_len: usize,
}
