//! Card value types.
//!
//! A [`Card`] is an immutable value: two cards with the same color and
//! rank are interchangeable, which is why equality (not identity) is how
//! the engine locates a card in a hand.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The printed color of a card. `Wild` is a color of its own on the
/// card face; the color a wild play *imposes* on the game is always one
/// of the four base colors (see `active_color` on the room view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardColor {
    Red,
    Yellow,
    Green,
    Blue,
    Wild,
}

impl CardColor {
    /// The four matchable colors, in a fixed order.
    pub const BASE: [CardColor; 4] = [
        CardColor::Red,
        CardColor::Yellow,
        CardColor::Green,
        CardColor::Blue,
    ];

    /// `true` for the four matchable colors, `false` for `Wild`.
    pub fn is_base(self) -> bool {
        !matches!(self, CardColor::Wild)
    }
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CardColor::Red => "red",
            CardColor::Yellow => "yellow",
            CardColor::Green => "green",
            CardColor::Blue => "blue",
            CardColor::Wild => "wild",
        };
        f.write_str(s)
    }
}

/// The rank printed on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Rank {
    /// Digits 0–9.
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Number(n) => write!(f, "{n}"),
            Rank::Skip => f.write_str("skip"),
            Rank::Reverse => f.write_str("reverse"),
            Rank::DrawTwo => f.write_str("draw-two"),
            Rank::Wild => f.write_str("wild"),
            Rank::WildDrawFour => f.write_str("wild-draw-four"),
        }
    }
}

/// An immutable card value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub color: CardColor,
    pub rank: Rank,
}

impl Card {
    pub fn new(color: CardColor, rank: Rank) -> Self {
        Self { color, rank }
    }

    /// Wild and WildDrawFour: plays that must declare a base color.
    pub fn is_wild_family(&self) -> bool {
        self.color == CardColor::Wild
    }

    /// Cards that add to the pending forced-draw stack when played.
    pub fn draw_penalty(&self) -> u32 {
        match self.rank {
            Rank::DrawTwo => 2,
            Rank::WildDrawFour => 4,
            _ => 0,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_equality_is_by_value() {
        let a = Card::new(CardColor::Red, Rank::Number(7));
        let b = Card::new(CardColor::Red, Rank::Number(7));
        let c = Card::new(CardColor::Blue, Rank::Number(7));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_wild_family_detection() {
        assert!(Card::new(CardColor::Wild, Rank::Wild).is_wild_family());
        assert!(
            Card::new(CardColor::Wild, Rank::WildDrawFour).is_wild_family()
        );
        assert!(!Card::new(CardColor::Green, Rank::Skip).is_wild_family());
    }

    #[test]
    fn test_draw_penalty_values() {
        assert_eq!(Card::new(CardColor::Red, Rank::DrawTwo).draw_penalty(), 2);
        assert_eq!(
            Card::new(CardColor::Wild, Rank::WildDrawFour).draw_penalty(),
            4
        );
        assert_eq!(Card::new(CardColor::Red, Rank::Reverse).draw_penalty(), 0);
    }

    #[test]
    fn test_base_colors_exclude_wild() {
        assert_eq!(CardColor::BASE.len(), 4);
        assert!(CardColor::BASE.iter().all(|c| c.is_base()));
        assert!(!CardColor::Wild.is_base());
    }

    #[test]
    fn test_card_json_round_trip() {
        let card = Card::new(CardColor::Yellow, Rank::Number(0));
        let bytes = serde_json::to_vec(&card).unwrap();
        let decoded: Card = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(card, decoded);
    }

    #[test]
    fn test_rank_json_shape() {
        let json: serde_json::Value =
            serde_json::to_value(Rank::Number(5)).unwrap();
        assert_eq!(json["kind"], "Number");
        assert_eq!(json["value"], 5);

        let json: serde_json::Value =
            serde_json::to_value(Rank::Skip).unwrap();
        assert_eq!(json["kind"], "Skip");
    }

    #[test]
    fn test_card_display() {
        let card = Card::new(CardColor::Blue, Rank::DrawTwo);
        assert_eq!(card.to_string(), "blue draw-two");
    }
}
