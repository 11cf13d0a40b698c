//! The turn state machine.
//!
//! [`apply`] is the only mutation path for an active game. Given the
//! authoritative state and an `(actor seat, action)` pair it either
//! performs the full transition or rejects with a typed error and no
//! state change. The coordinator serializes calls; this module assumes
//! exclusive access for the duration of one transition.

use rand::Rng;
use wildcard_protocol::{Card, CardColor, GamePhase, Rank, SeatIndex};

use crate::{GameState, deck};

/// An action submitted against a room, already resolved to a seat.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    PlayCard {
        card: Card,
        declared_color: Option<CardColor>,
    },
    DrawCard,
    PassTurn,
    DeclareLastCard,
    ChallengeLastCard { target: SeatIndex },
}

/// Why a transition was rejected.
///
/// All variants except `DeckExhausted` are validation failures: state is
/// untouched and the message goes back to the acting client only.
/// `DeckExhausted` cannot occur while card conservation holds and is
/// treated as fatal by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("not your turn")]
    NotYourTurn,

    #[error("the game is not in progress")]
    GameNotActive,

    #[error("no such seat: {0}")]
    UnknownSeat(SeatIndex),

    #[error("card {0} is not in your hand")]
    CardNotInHand(Card),

    #[error("card {0} cannot be played on the current discard")]
    IllegalCard(Card),

    #[error("a forced draw of {0} is pending; play a draw card or draw")]
    PenaltyPending(u32),

    #[error("wild cards must declare a color")]
    MissingDeclaredColor,

    #[error("declared color must be red, yellow, green, or blue")]
    InvalidDeclaredColor(CardColor),

    #[error("already drew this turn; play the drawn card or pass")]
    AlreadyDrew,

    #[error("after drawing, only the drawn card may be played")]
    OnlyDrawnCardPlayable,

    #[error("cannot pass without drawing first")]
    NothingDrawn,

    #[error("last-card can only be declared with exactly one card left")]
    NotLastCard,

    #[error("challenge rejected")]
    ChallengeRejected,

    #[error("draw pile exhausted even after reshuffle")]
    DeckExhausted,
}

/// Applies one action to the game.
///
/// `rng` feeds the reshuffle rule when the draw pile runs dry mid-draw.
pub fn apply(
    state: &mut GameState,
    actor: SeatIndex,
    action: &Action,
    rng: &mut impl Rng,
) -> Result<(), TurnError> {
    if actor.0 >= state.seats.len() {
        return Err(TurnError::UnknownSeat(actor));
    }
    if !state.phase.is_active() {
        return Err(TurnError::GameNotActive);
    }

    match action {
        // Room-scoped actions: legal off-turn.
        Action::DeclareLastCard => declare_last_card(state, actor),
        Action::ChallengeLastCard { target } => {
            challenge_last_card(state, actor, *target, rng)
        }

        // Turn-gated actions.
        _ if actor.0 != state.turn => Err(TurnError::NotYourTurn),
        Action::PlayCard {
            card,
            declared_color,
        } => play_card(state, actor, *card, *declared_color),
        Action::DrawCard => draw_card(state, actor, rng),
        Action::PassTurn => pass_turn(state),
    }
}

fn play_card(
    state: &mut GameState,
    actor: SeatIndex,
    card: Card,
    declared_color: Option<CardColor>,
) -> Result<(), TurnError> {
    // A pending draw stack can only be extended, never played around.
    if state.pending_draw > 0 && card.draw_penalty() == 0 {
        return Err(TurnError::PenaltyPending(state.pending_draw));
    }

    // Draw-then-play: once a card was drawn this turn, it is the only
    // playable card.
    if let Some(drawn) = state.drawn_card {
        if card != drawn {
            return Err(TurnError::OnlyDrawnCardPlayable);
        }
    }

    let pos = state.seats[actor.0]
        .hand
        .iter()
        .position(|c| *c == card)
        .ok_or(TurnError::CardNotInHand(card))?;

    let top = *state.top_discard().expect("active game has a discard");
    let active = state.active_color.expect("active game has a color");
    if !deck::is_legal(&card, &top, active) {
        return Err(TurnError::IllegalCard(card));
    }

    let next_color = if card.is_wild_family() {
        match declared_color {
            Some(c) if c.is_base() => c,
            Some(c) => return Err(TurnError::InvalidDeclaredColor(c)),
            None => return Err(TurnError::MissingDeclaredColor),
        }
    } else {
        card.color
    };

    // Validation done; mutate.
    state.seats[actor.0].hand.remove(pos);
    state.discard_pile.push(card);
    state.active_color = Some(next_color);
    state.pending_draw += card.draw_penalty();

    if state.seats[actor.0].hand.is_empty() {
        state.phase = GamePhase::Finished { winner: actor };
        state.drawn_card = None;
        tracing::info!(room = %state.code(), %actor, "game won");
        return Ok(());
    }
    if state.seats[actor.0].hand.len() == 1 {
        // Down to the last card: any earlier declaration is void.
        state.seats[actor.0].declared_last_card = false;
    }

    let steps = match card.rank {
        Rank::Skip => 2,
        Rank::Reverse => {
            state.direction = state.direction.flipped();
            // With two seats a reverse degenerates to a skip.
            if state.seats.len() == 2 { 2 } else { 1 }
        }
        _ => 1,
    };
    state.advance(steps);
    Ok(())
}

fn draw_card(
    state: &mut GameState,
    actor: SeatIndex,
    rng: &mut impl Rng,
) -> Result<(), TurnError> {
    if state.pending_draw > 0 {
        // Forced draw: take the whole stack, turn ends.
        let n = state.pending_draw as usize;
        let mut cards = Vec::with_capacity(n);
        for _ in 0..n {
            cards.push(
                state
                    .take_from_draw_pile(rng)
                    .ok_or(TurnError::DeckExhausted)?,
            );
        }
        state.give_cards(actor.0, cards);
        state.pending_draw = 0;
        state.advance(1);
        return Ok(());
    }

    if state.drawn_card.is_some() {
        return Err(TurnError::AlreadyDrew);
    }

    let card = state
        .take_from_draw_pile(rng)
        .ok_or(TurnError::DeckExhausted)?;
    state.give_cards(actor.0, vec![card]);

    let top = *state.top_discard().expect("active game has a discard");
    let active = state.active_color.expect("active game has a color");
    if deck::is_legal(&card, &top, active) {
        // Playable: the drawer keeps the turn and may play exactly this
        // card or pass.
        state.drawn_card = Some(card);
    } else {
        state.advance(1);
    }
    Ok(())
}

fn pass_turn(state: &mut GameState) -> Result<(), TurnError> {
    if state.drawn_card.is_none() {
        return Err(TurnError::NothingDrawn);
    }
    state.advance(1);
    Ok(())
}

fn declare_last_card(
    state: &mut GameState,
    actor: SeatIndex,
) -> Result<(), TurnError> {
    if state.seats[actor.0].hand.len() != 1 {
        return Err(TurnError::NotLastCard);
    }
    state.seats[actor.0].declared_last_card = true;
    Ok(())
}

fn challenge_last_card(
    state: &mut GameState,
    actor: SeatIndex,
    target: SeatIndex,
    rng: &mut impl Rng,
) -> Result<(), TurnError> {
    if target.0 >= state.seats.len() {
        return Err(TurnError::UnknownSeat(target));
    }
    let seat = &state.seats[target.0];
    if target == actor
        || seat.hand.len() != 1
        || seat.declared_last_card
    {
        return Err(TurnError::ChallengeRejected);
    }

    let mut cards = Vec::with_capacity(2);
    for _ in 0..2 {
        cards.push(
            state
                .take_from_draw_pile(rng)
                .ok_or(TurnError::DeckExhausted)?,
        );
    }
    state.give_cards(target.0, cards);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rules;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use wildcard_protocol::{Direction, PlayerId, RoomCode};

    fn c(color: CardColor, rank: Rank) -> Card {
        Card::new(color, rank)
    }

    fn red(n: u8) -> Card {
        c(CardColor::Red, Rank::Number(n))
    }

    fn blue(n: u8) -> Card {
        c(CardColor::Blue, Rank::Number(n))
    }

    /// Builds an active game with fully controlled hands, discard top,
    /// and active color. The draw pile holds the rest of the 108 cards
    /// so conservation stays intact.
    fn rig(hands: &[&[Card]], top: Card, active: CardColor) -> GameState {
        let mut gs =
            GameState::new(RoomCode::new("RIGGED"), Rules::default());
        for i in 0..hands.len() {
            gs.add_human(PlayerId(i as u64 + 1)).unwrap();
        }

        let mut pool = deck::build();
        let mut take = |pool: &mut Vec<Card>, wanted: &Card| -> Card {
            let pos = pool
                .iter()
                .position(|p| p == wanted)
                .expect("rigged card must exist in a full deck");
            pool.remove(pos)
        };

        for (i, hand) in hands.iter().enumerate() {
            gs.seats[i].hand =
                hand.iter().map(|card| take(&mut pool, card)).collect();
        }
        gs.discard_pile = vec![take(&mut pool, &top)];
        gs.draw_pile = pool;
        gs.active_color = Some(active);
        gs.turn = 0;
        gs.direction = Direction::Clockwise;
        gs.pending_draw = 0;
        gs.drawn_card = None;
        gs.phase = GamePhase::Active;
        gs.check_invariants().unwrap();
        gs
    }

    /// Forces the next drawn card by moving it to the end of the pile.
    fn plant_next_draw(gs: &mut GameState, card: Card) {
        let pos = gs
            .draw_pile
            .iter()
            .position(|p| *p == card)
            .expect("card must be in the draw pile");
        let card = gs.draw_pile.remove(pos);
        gs.draw_pile.push(card);
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    // -- PlayCard guards ---------------------------------------------------

    #[test]
    fn test_play_out_of_turn_rejected() {
        let mut gs = rig(&[&[red(1)], &[red(2)]], red(5), CardColor::Red);
        let err = apply(
            &mut gs,
            SeatIndex(1),
            &Action::PlayCard { card: red(2), declared_color: None },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::NotYourTurn);
    }

    #[test]
    fn test_play_card_not_in_hand_rejected() {
        let mut gs =
            rig(&[&[red(1), red(2)], &[blue(3)]], red(5), CardColor::Red);
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: red(9), declared_color: None },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::CardNotInHand(red(9)));
    }

    #[test]
    fn test_play_illegal_card_rejected_without_mutation() {
        let mut gs =
            rig(&[&[blue(6), red(1)], &[red(2)]], red(5), CardColor::Red);
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: blue(6), declared_color: None },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::IllegalCard(blue(6)));
        assert_eq!(gs.seats()[0].hand.len(), 2);
        assert_eq!(gs.current_turn(), SeatIndex(0));
    }

    #[test]
    fn test_play_on_finished_game_rejected() {
        let mut gs = rig(&[&[red(1)], &[red(2)]], red(5), CardColor::Red);
        gs.phase = GamePhase::Finished { winner: SeatIndex(1) };
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: red(1), declared_color: None },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::GameNotActive);
    }

    // -- Number plays --------------------------------------------------------

    #[test]
    fn test_number_play_advances_exactly_one() {
        let mut gs = rig(
            &[&[red(1), red(2)], &[blue(3)], &[blue(4)]],
            red(5),
            CardColor::Red,
        );
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: red(1), declared_color: None },
            &mut rng(),
        )
        .unwrap();
        assert_eq!(gs.current_turn(), SeatIndex(1));
        assert_eq!(*gs.top_discard().unwrap(), red(1));
        assert_eq!(gs.active_color(), Some(CardColor::Red));
        gs.check_invariants().unwrap();
    }

    #[test]
    fn test_rank_match_play_switches_active_color() {
        let mut gs = rig(
            &[&[blue(5), red(2)], &[red(3)]],
            red(5),
            CardColor::Red,
        );
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: blue(5), declared_color: None },
            &mut rng(),
        )
        .unwrap();
        assert_eq!(gs.active_color(), Some(CardColor::Blue));
    }

    // -- Special cards ---------------------------------------------------------

    #[test]
    fn test_reverse_in_two_seat_room_acts_as_skip() {
        // Scenario: seat 0 plays Reverse in a 2-seat room; the turn must
        // come back to seat 0, not move to seat 1.
        let mut gs = rig(
            &[&[c(CardColor::Red, Rank::Reverse), red(2)], &[blue(3)]],
            red(5),
            CardColor::Red,
        );
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Red, Rank::Reverse),
                declared_color: None,
            },
            &mut rng(),
        )
        .unwrap();
        assert_eq!(gs.current_turn(), SeatIndex(0));
        assert_eq!(gs.direction(), Direction::CounterClockwise);
    }

    #[test]
    fn test_reverse_in_three_seat_room_flips_rotation() {
        let mut gs = rig(
            &[
                &[c(CardColor::Red, Rank::Reverse), red(2)],
                &[blue(3)],
                &[blue(4)],
            ],
            red(5),
            CardColor::Red,
        );
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Red, Rank::Reverse),
                declared_color: None,
            },
            &mut rng(),
        )
        .unwrap();
        // Flipped direction: one step back from seat 0 is seat 2.
        assert_eq!(gs.current_turn(), SeatIndex(2));
        assert_eq!(gs.direction(), Direction::CounterClockwise);
    }

    #[test]
    fn test_skip_advances_two() {
        let mut gs = rig(
            &[
                &[c(CardColor::Red, Rank::Skip), red(2)],
                &[blue(3)],
                &[blue(4)],
            ],
            red(5),
            CardColor::Red,
        );
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Red, Rank::Skip),
                declared_color: None,
            },
            &mut rng(),
        )
        .unwrap();
        assert_eq!(gs.current_turn(), SeatIndex(2));
    }

    #[test]
    fn test_draw_two_stacks_penalty_and_advances() {
        let mut gs = rig(
            &[&[c(CardColor::Red, Rank::DrawTwo), red(2)], &[blue(3)]],
            red(5),
            CardColor::Red,
        );
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Red, Rank::DrawTwo),
                declared_color: None,
            },
            &mut rng(),
        )
        .unwrap();
        assert_eq!(gs.pending_draw(), 2);
        assert_eq!(gs.current_turn(), SeatIndex(1));
    }

    #[test]
    fn test_forced_draw_takes_full_stack_and_ends_turn() {
        // Scenario: penalty of 2 pending; the next seat draws exactly 2,
        // the penalty resets, and the pointer advances by one.
        let mut gs = rig(
            &[&[c(CardColor::Red, Rank::DrawTwo), red(2)], &[blue(3)]],
            red(5),
            CardColor::Red,
        );
        let mut r = rng();
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Red, Rank::DrawTwo),
                declared_color: None,
            },
            &mut r,
        )
        .unwrap();

        apply(&mut gs, SeatIndex(1), &Action::DrawCard, &mut r).unwrap();
        assert_eq!(gs.seats()[1].hand.len(), 3);
        assert_eq!(gs.pending_draw(), 0);
        assert_eq!(gs.current_turn(), SeatIndex(0));
        gs.check_invariants().unwrap();
    }

    #[test]
    fn test_penalty_can_be_stacked_with_another_draw_card() {
        let mut gs = rig(
            &[
                &[c(CardColor::Red, Rank::DrawTwo), red(2)],
                &[c(CardColor::Blue, Rank::DrawTwo), blue(3)],
                &[blue(4)],
            ],
            red(5),
            CardColor::Red,
        );
        let mut r = rng();
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Red, Rank::DrawTwo),
                declared_color: None,
            },
            &mut r,
        )
        .unwrap();
        // Seat 1 stacks a DrawTwo (rank match) instead of drawing.
        apply(
            &mut gs,
            SeatIndex(1),
            &Action::PlayCard {
                card: c(CardColor::Blue, Rank::DrawTwo),
                declared_color: None,
            },
            &mut r,
        )
        .unwrap();
        assert_eq!(gs.pending_draw(), 4);
        assert_eq!(gs.current_turn(), SeatIndex(2));
    }

    #[test]
    fn test_non_penalty_play_rejected_while_penalty_pending() {
        let mut gs = rig(
            &[
                &[c(CardColor::Red, Rank::DrawTwo), red(2)],
                &[red(7), blue(3)],
            ],
            red(5),
            CardColor::Red,
        );
        let mut r = rng();
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Red, Rank::DrawTwo),
                declared_color: None,
            },
            &mut r,
        )
        .unwrap();
        let err = apply(
            &mut gs,
            SeatIndex(1),
            &Action::PlayCard { card: red(7), declared_color: None },
            &mut r,
        )
        .unwrap_err();
        assert_eq!(err, TurnError::PenaltyPending(2));
    }

    // -- Wild cards -------------------------------------------------------------

    #[test]
    fn test_wild_requires_declared_color() {
        let mut gs = rig(
            &[&[c(CardColor::Wild, Rank::Wild), red(2)], &[blue(3)]],
            red(5),
            CardColor::Red,
        );
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Wild, Rank::Wild),
                declared_color: None,
            },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::MissingDeclaredColor);
    }

    #[test]
    fn test_wild_rejects_wild_as_declared_color() {
        let mut gs = rig(
            &[&[c(CardColor::Wild, Rank::Wild), red(2)], &[blue(3)]],
            red(5),
            CardColor::Red,
        );
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Wild, Rank::Wild),
                declared_color: Some(CardColor::Wild),
            },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::InvalidDeclaredColor(CardColor::Wild));
    }

    #[test]
    fn test_wild_sets_declared_active_color() {
        let mut gs = rig(
            &[&[c(CardColor::Wild, Rank::Wild), red(2)], &[blue(3)]],
            red(5),
            CardColor::Red,
        );
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Wild, Rank::Wild),
                declared_color: Some(CardColor::Green),
            },
            &mut rng(),
        )
        .unwrap();
        assert_eq!(gs.active_color(), Some(CardColor::Green));
        assert_eq!(gs.current_turn(), SeatIndex(1));
    }

    #[test]
    fn test_wild_draw_four_stacks_four() {
        let mut gs = rig(
            &[
                &[c(CardColor::Wild, Rank::WildDrawFour), red(2)],
                &[blue(3)],
            ],
            red(5),
            CardColor::Red,
        );
        let mut r = rng();
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard {
                card: c(CardColor::Wild, Rank::WildDrawFour),
                declared_color: Some(CardColor::Blue),
            },
            &mut r,
        )
        .unwrap();
        assert_eq!(gs.pending_draw(), 4);

        apply(&mut gs, SeatIndex(1), &Action::DrawCard, &mut r).unwrap();
        assert_eq!(gs.seats()[1].hand.len(), 5);
        assert_eq!(gs.pending_draw(), 0);
    }

    // -- Draw-then-play policy -------------------------------------------------

    #[test]
    fn test_drawing_playable_card_keeps_turn() {
        let mut gs =
            rig(&[&[blue(6), blue(7)], &[blue(3)]], red(5), CardColor::Red);
        plant_next_draw(&mut gs, red(9));
        let mut r = rng();
        apply(&mut gs, SeatIndex(0), &Action::DrawCard, &mut r).unwrap();
        assert_eq!(gs.current_turn(), SeatIndex(0));
        assert_eq!(gs.drawn_card(), Some(red(9)));

        // The drawn card may be played.
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: red(9), declared_color: None },
            &mut r,
        )
        .unwrap();
        assert_eq!(*gs.top_discard().unwrap(), red(9));
        assert_eq!(gs.current_turn(), SeatIndex(1));
    }

    #[test]
    fn test_only_the_drawn_card_may_be_played_after_drawing() {
        let mut gs =
            rig(&[&[red(1), blue(7)], &[blue(3)]], red(5), CardColor::Red);
        plant_next_draw(&mut gs, red(9));
        let mut r = rng();
        apply(&mut gs, SeatIndex(0), &Action::DrawCard, &mut r).unwrap();

        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: red(1), declared_color: None },
            &mut r,
        )
        .unwrap_err();
        assert_eq!(err, TurnError::OnlyDrawnCardPlayable);
    }

    #[test]
    fn test_pass_after_draw_ends_turn() {
        let mut gs =
            rig(&[&[blue(6)], &[blue(3)]], red(5), CardColor::Red);
        plant_next_draw(&mut gs, red(9));
        let mut r = rng();
        apply(&mut gs, SeatIndex(0), &Action::DrawCard, &mut r).unwrap();
        apply(&mut gs, SeatIndex(0), &Action::PassTurn, &mut r).unwrap();
        assert_eq!(gs.current_turn(), SeatIndex(1));
        assert_eq!(gs.drawn_card(), None);
    }

    #[test]
    fn test_drawing_unplayable_card_advances_turn() {
        let mut gs =
            rig(&[&[blue(6)], &[blue(3)]], red(5), CardColor::Red);
        plant_next_draw(&mut gs, blue(8));
        apply(&mut gs, SeatIndex(0), &Action::DrawCard, &mut rng())
            .unwrap();
        assert_eq!(gs.current_turn(), SeatIndex(1));
        assert_eq!(gs.seats()[0].hand.len(), 2);
    }

    #[test]
    fn test_second_draw_in_same_turn_rejected() {
        let mut gs =
            rig(&[&[blue(6)], &[blue(3)]], red(5), CardColor::Red);
        plant_next_draw(&mut gs, red(9));
        let mut r = rng();
        apply(&mut gs, SeatIndex(0), &Action::DrawCard, &mut r).unwrap();
        let err = apply(&mut gs, SeatIndex(0), &Action::DrawCard, &mut r)
            .unwrap_err();
        assert_eq!(err, TurnError::AlreadyDrew);
    }

    #[test]
    fn test_pass_without_draw_rejected() {
        let mut gs =
            rig(&[&[blue(6)], &[blue(3)]], red(5), CardColor::Red);
        let err = apply(&mut gs, SeatIndex(0), &Action::PassTurn, &mut rng())
            .unwrap_err();
        assert_eq!(err, TurnError::NothingDrawn);
    }

    // -- Declarations and challenges -------------------------------------------

    #[test]
    fn test_declare_with_one_card_sets_flag() {
        let mut gs = rig(&[&[red(1)], &[blue(3)]], red(5), CardColor::Red);
        apply(&mut gs, SeatIndex(0), &Action::DeclareLastCard, &mut rng())
            .unwrap();
        assert!(gs.seats()[0].declared_last_card);
        // No turn effect.
        assert_eq!(gs.current_turn(), SeatIndex(0));
    }

    #[test]
    fn test_declare_with_more_cards_rejected() {
        let mut gs =
            rig(&[&[red(1), red(2)], &[blue(3)]], red(5), CardColor::Red);
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::DeclareLastCard,
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::NotLastCard);
    }

    #[test]
    fn test_declare_is_not_turn_gated() {
        let mut gs = rig(&[&[red(1), red(2)], &[blue(3)]], red(5), CardColor::Red);
        // Seat 1 declares while it is seat 0's turn.
        apply(&mut gs, SeatIndex(1), &Action::DeclareLastCard, &mut rng())
            .unwrap();
        assert!(gs.seats()[1].declared_last_card);
    }

    #[test]
    fn test_challenge_penalizes_undeclared_last_card() {
        // Scenario: seat 1 is down to one undeclared card; seat 0
        // challenges. Seat 1 draws two and their turn position is
        // untouched.
        let mut gs =
            rig(&[&[red(1), red(2)], &[blue(3)]], red(5), CardColor::Red);
        let turn_before = gs.current_turn();
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::ChallengeLastCard { target: SeatIndex(1) },
            &mut rng(),
        )
        .unwrap();
        assert_eq!(gs.seats()[1].hand.len(), 3);
        assert!(!gs.seats()[1].declared_last_card);
        assert_eq!(gs.current_turn(), turn_before);
        gs.check_invariants().unwrap();
    }

    #[test]
    fn test_challenge_rejected_when_target_declared() {
        let mut gs =
            rig(&[&[red(1), red(2)], &[blue(3)]], red(5), CardColor::Red);
        apply(&mut gs, SeatIndex(1), &Action::DeclareLastCard, &mut rng())
            .unwrap();
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::ChallengeLastCard { target: SeatIndex(1) },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::ChallengeRejected);
        assert_eq!(gs.seats()[1].hand.len(), 1);
    }

    #[test]
    fn test_challenge_rejected_when_target_holds_more_cards() {
        let mut gs = rig(
            &[&[red(1)], &[blue(3), blue(4)]],
            red(5),
            CardColor::Red,
        );
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::ChallengeLastCard { target: SeatIndex(1) },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::ChallengeRejected);
    }

    #[test]
    fn test_self_challenge_rejected() {
        let mut gs = rig(&[&[red(1)], &[blue(3)]], red(5), CardColor::Red);
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::ChallengeLastCard { target: SeatIndex(0) },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::ChallengeRejected);
    }

    #[test]
    fn test_challenge_unknown_seat_rejected() {
        let mut gs = rig(&[&[red(1)], &[blue(3)]], red(5), CardColor::Red);
        let err = apply(
            &mut gs,
            SeatIndex(0),
            &Action::ChallengeLastCard { target: SeatIndex(9) },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, TurnError::UnknownSeat(SeatIndex(9)));
    }

    // -- Winning -----------------------------------------------------------------

    #[test]
    fn test_playing_last_card_finishes_the_game() {
        let mut gs = rig(&[&[red(1)], &[blue(3)]], red(5), CardColor::Red);
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: red(1), declared_color: None },
            &mut rng(),
        )
        .unwrap();
        assert_eq!(
            gs.phase(),
            GamePhase::Finished { winner: SeatIndex(0) }
        );
        gs.check_invariants().unwrap();
    }

    #[test]
    fn test_finished_game_is_frozen() {
        // Win-detection idempotence: nothing mutates after Finished.
        let mut gs = rig(&[&[red(1)], &[blue(3)]], red(5), CardColor::Red);
        let mut r = rng();
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: red(1), declared_color: None },
            &mut r,
        )
        .unwrap();

        let hand_before = gs.seats()[1].hand.clone();
        let draw_before = gs.draw_pile_len();
        assert_eq!(
            apply(&mut gs, SeatIndex(1), &Action::DrawCard, &mut r),
            Err(TurnError::GameNotActive)
        );
        assert_eq!(
            apply(
                &mut gs,
                SeatIndex(1),
                &Action::PlayCard { card: blue(3), declared_color: None },
                &mut r,
            ),
            Err(TurnError::GameNotActive)
        );
        assert_eq!(gs.seats()[1].hand, hand_before);
        assert_eq!(gs.draw_pile_len(), draw_before);
    }

    #[test]
    fn test_playing_down_to_one_card_requires_fresh_declaration() {
        let mut gs =
            rig(&[&[red(1), red(2)], &[blue(3)]], red(5), CardColor::Red);
        apply(
            &mut gs,
            SeatIndex(0),
            &Action::PlayCard { card: red(1), declared_color: None },
            &mut rng(),
        )
        .unwrap();
        assert_eq!(gs.seats()[0].hand.len(), 1);
        assert!(!gs.seats()[0].declared_last_card);
    }
}
