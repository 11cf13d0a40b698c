//! The scripted decision policy for bot seats.
//!
//! Bots go through the exact same action vocabulary and validation as
//! humans; this module only picks the move. The policy is deterministic
//! given a hand and the table state, which keeps games with bots
//! reproducible under a seeded deal.

use std::sync::atomic::{AtomicUsize, Ordering};

use wildcard_protocol::{Card, CardColor, SeatIndex};

use crate::{GameState, deck};

/// Identity of one bot seat.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BotProfile {
    pub name: String,
}

impl BotProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Hands out display names for newly seated bots.
#[derive(Debug, Default)]
pub struct BotRoster {
    next: AtomicUsize,
}

const BOT_NAMES: &[&str] = &["Brook", "Quill", "Sable", "Fen", "Marlow"];

impl BotRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next profile. Names repeat with a numeric suffix once the pool is
    /// exhausted.
    pub fn next_profile(&self) -> BotProfile {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let base = BOT_NAMES[n % BOT_NAMES.len()];
        let round = n / BOT_NAMES.len();
        if round == 0 {
            BotProfile::named(base)
        } else {
            BotProfile::named(format!("{base} {}", round + 1))
        }
    }
}

/// A move chosen by the policy.
#[derive(Debug, Clone, PartialEq)]
pub enum BotMove {
    Play {
        card: Card,
        declared_color: Option<CardColor>,
    },
    Draw,
}

/// Picks a move for `seat`, which must hold the turn.
///
/// Preference order: first playable non-wild in hand order, then first
/// playable wild-family card, then draw. Wild plays declare the most
/// frequent base color left in the hand after the play, ties broken by
/// the [`CardColor::BASE`] order.
pub fn decide(state: &GameState, seat: SeatIndex) -> BotMove {
    let hand = &state.seats()[seat.0].hand;
    let top = match state.top_discard() {
        Some(top) => *top,
        None => return BotMove::Draw,
    };
    let active = match state.active_color() {
        Some(c) => c,
        None => return BotMove::Draw,
    };

    // After a non-forced draw only the drawn card is playable, and it is
    // only retained when legal; play it.
    if let Some(drawn) = state.drawn_card() {
        let declared = if drawn.is_wild_family() {
            let pos = hand
                .iter()
                .position(|c| *c == drawn)
                .unwrap_or(hand.len());
            Some(choose_color(hand, pos))
        } else {
            None
        };
        return BotMove::Play {
            card: drawn,
            declared_color: declared,
        };
    }

    let playable = |card: &Card| {
        deck::is_legal(card, &top, active)
            && (state.pending_draw() == 0 || card.draw_penalty() > 0)
    };

    if let Some(card) = hand
        .iter()
        .copied()
        .find(|c| !c.is_wild_family() && playable(c))
    {
        return BotMove::Play {
            card,
            declared_color: None,
        };
    }

    if let Some((pos, card)) = hand
        .iter()
        .enumerate()
        .find(|(_, c)| c.is_wild_family() && playable(*c))
    {
        return BotMove::Play {
            card: *card,
            declared_color: Some(choose_color(hand, pos)),
        };
    }

    BotMove::Draw
}

/// The color to declare when playing the wild at `skip` in `hand`: the
/// most frequent base color among the remaining cards.
fn choose_color(hand: &[Card], skip: usize) -> CardColor {
    let mut counts = [0usize; 4];
    for (i, card) in hand.iter().enumerate() {
        if i == skip {
            continue;
        }
        if let Some(slot) =
            CardColor::BASE.iter().position(|c| *c == card.color)
        {
            counts[slot] += 1;
        }
    }
    let best = counts
        .iter()
        .enumerate()
        .max_by_key(|(i, n)| (**n, usize::MAX - i))
        .map(|(i, _)| i)
        .unwrap_or(0);
    CardColor::BASE[best]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rules;
    use wildcard_protocol::{GamePhase, PlayerId, Rank, RoomCode};

    fn c(color: CardColor, rank: Rank) -> Card {
        Card::new(color, rank)
    }

    /// Minimal active two-seat state with seat 0 holding `hand`.
    fn table(hand: Vec<Card>, top: Card, active: CardColor) -> GameState {
        let mut gs =
            GameState::new(RoomCode::new("BOTTED"), Rules::default());
        gs.add_human(PlayerId(1)).unwrap();
        gs.add_human(PlayerId(2)).unwrap();
        gs.seats[0].hand = hand;
        gs.seats[1].hand = vec![c(CardColor::Green, Rank::Number(1))];
        gs.discard_pile = vec![top];
        gs.draw_pile = Vec::new();
        gs.active_color = Some(active);
        gs.phase = GamePhase::Active;
        gs
    }

    #[test]
    fn test_prefers_first_playable_non_wild_in_hand_order() {
        let gs = table(
            vec![
                c(CardColor::Blue, Rank::Number(9)),
                c(CardColor::Red, Rank::Number(2)),
                c(CardColor::Red, Rank::Number(8)),
                c(CardColor::Wild, Rank::Wild),
            ],
            c(CardColor::Red, Rank::Number(5)),
            CardColor::Red,
        );
        assert_eq!(
            decide(&gs, SeatIndex(0)),
            BotMove::Play {
                card: c(CardColor::Red, Rank::Number(2)),
                declared_color: None,
            }
        );
    }

    #[test]
    fn test_falls_back_to_wild_with_majority_color() {
        // Scenario: hand holds one Wild plus two Blue and one Green card,
        // nothing playable on a Red 5. The bot plays the Wild and declares
        // Blue.
        let gs = table(
            vec![
                c(CardColor::Blue, Rank::Number(9)),
                c(CardColor::Wild, Rank::Wild),
                c(CardColor::Blue, Rank::Number(3)),
                c(CardColor::Green, Rank::Number(7)),
            ],
            c(CardColor::Red, Rank::Number(5)),
            CardColor::Red,
        );
        assert_eq!(
            decide(&gs, SeatIndex(0)),
            BotMove::Play {
                card: c(CardColor::Wild, Rank::Wild),
                declared_color: Some(CardColor::Blue),
            }
        );
    }

    #[test]
    fn test_color_tie_breaks_toward_red() {
        let gs = table(
            vec![
                c(CardColor::Wild, Rank::Wild),
                c(CardColor::Blue, Rank::Number(9)),
                c(CardColor::Red, Rank::Number(9)),
            ],
            c(CardColor::Green, Rank::Number(5)),
            CardColor::Green,
        );
        assert_eq!(
            decide(&gs, SeatIndex(0)),
            BotMove::Play {
                card: c(CardColor::Wild, Rank::Wild),
                declared_color: Some(CardColor::Red),
            }
        );
    }

    #[test]
    fn test_draws_when_nothing_is_playable() {
        let gs = table(
            vec![
                c(CardColor::Blue, Rank::Number(9)),
                c(CardColor::Green, Rank::Number(3)),
            ],
            c(CardColor::Red, Rank::Number(5)),
            CardColor::Red,
        );
        assert_eq!(decide(&gs, SeatIndex(0)), BotMove::Draw);
    }

    #[test]
    fn test_respects_pending_penalty_gate() {
        // A color-matching number card is not playable onto a pending
        // stack; only the DrawTwo is.
        let mut gs = table(
            vec![
                c(CardColor::Red, Rank::Number(4)),
                c(CardColor::Red, Rank::DrawTwo),
            ],
            c(CardColor::Red, Rank::DrawTwo),
            CardColor::Red,
        );
        gs.pending_draw = 2;
        assert_eq!(
            decide(&gs, SeatIndex(0)),
            BotMove::Play {
                card: c(CardColor::Red, Rank::DrawTwo),
                declared_color: None,
            }
        );

        gs.seats[0].hand = vec![c(CardColor::Red, Rank::Number(4))];
        assert_eq!(decide(&gs, SeatIndex(0)), BotMove::Draw);
    }

    #[test]
    fn test_plays_the_retained_drawn_card() {
        let mut gs = table(
            vec![
                c(CardColor::Blue, Rank::Number(9)),
                c(CardColor::Red, Rank::Number(2)),
            ],
            c(CardColor::Red, Rank::Number(5)),
            CardColor::Red,
        );
        gs.drawn_card = Some(c(CardColor::Red, Rank::Number(2)));
        assert_eq!(
            decide(&gs, SeatIndex(0)),
            BotMove::Play {
                card: c(CardColor::Red, Rank::Number(2)),
                declared_color: None,
            }
        );
    }

    #[test]
    fn test_roster_names_are_distinct() {
        let roster = BotRoster::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..12 {
            assert!(seen.insert(roster.next_profile().name));
        }
    }
}
