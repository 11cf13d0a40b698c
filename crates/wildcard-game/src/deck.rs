//! Deck composition, shuffling, and the card legality rule.
//!
//! All functions here are pure; empty-pile handling lives in the turn
//! engine's reshuffle rule, not here.

use rand::Rng;
use rand::seq::SliceRandom;
use wildcard_protocol::{Card, CardColor, Rank};

/// A full deck: 25 cards per base color, 8 Wild, 8 WildDrawFour.
pub const DECK_SIZE: usize = 108;

/// Builds an unshuffled full deck.
///
/// Per base color: one 0, two of each 1–9, two each of Skip, Reverse,
/// and DrawTwo. Plus eight Wild and eight WildDrawFour.
pub fn build() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for color in CardColor::BASE {
        cards.push(Card::new(color, Rank::Number(0)));
        for n in 1..=9 {
            cards.push(Card::new(color, Rank::Number(n)));
            cards.push(Card::new(color, Rank::Number(n)));
        }
        for rank in [Rank::Skip, Rank::Reverse, Rank::DrawTwo] {
            cards.push(Card::new(color, rank));
            cards.push(Card::new(color, rank));
        }
    }
    for _ in 0..8 {
        cards.push(Card::new(CardColor::Wild, Rank::Wild));
        cards.push(Card::new(CardColor::Wild, Rank::WildDrawFour));
    }
    debug_assert_eq!(cards.len(), DECK_SIZE);
    cards
}

/// Uniform random permutation (Fisher–Yates via `SliceRandom`).
pub fn shuffle(cards: &mut [Card], rng: &mut impl Rng) {
    cards.shuffle(rng);
}

/// Whether `card` may be played on `top` under `active_color`.
///
/// Legal iff the card matches the active color, matches the top card's
/// rank, or is wild-family. `active_color` is the declared color, which
/// for wild tops differs from the top card's own printed color.
pub fn is_legal(card: &Card, top: &Card, active_color: CardColor) -> bool {
    card.color == CardColor::Wild
        || card.color == active_color
        || card.rank == top.rank
}
