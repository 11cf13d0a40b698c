//! Per-recipient projections of the authoritative state.
//!
//! Clients never see [`crate::GameState`] directly. Every broadcast is
//! recomputed here per recipient so that only the recipient's own hand
//! is visible; everyone else's hand is reduced to a count. Piles are
//! exposed as top-of-discard plus draw-pile length only.

use wildcard_protocol::{
    CardsView, RoomView, SeatIndex, SeatOccupant, SeatView,
};

use crate::{GameState, Occupant};

/// Builds the room snapshot as seen by `recipient`.
///
/// `None` projects a spectator view with every hand hidden; this is also
/// what observability hooks get. Bot seats are projected with their
/// display name, never a player id.
pub fn project(state: &GameState, recipient: Option<SeatIndex>) -> RoomView {
    let seats = state
        .seats()
        .iter()
        .enumerate()
        .map(|(i, seat)| {
            let occupant = match &seat.occupant {
                Occupant::Human(player) => {
                    SeatOccupant::Human { player: *player }
                }
                Occupant::Bot(profile) => SeatOccupant::Bot {
                    name: profile.name.clone(),
                },
            };
            let cards = if recipient == Some(SeatIndex(i)) {
                CardsView::Visible {
                    cards: seat.hand.clone(),
                }
            } else {
                CardsView::Hidden {
                    count: seat.hand.len(),
                }
            };
            SeatView {
                occupant,
                cards,
                declared_last_card: seat.declared_last_card,
            }
        })
        .collect();

    RoomView {
        code: state.code().clone(),
        seats,
        phase: state.phase(),
        turn: state.current_turn(),
        direction: state.direction(),
        top_discard: state.top_discard().copied(),
        active_color: state.active_color(),
        pending_draw: state.pending_draw(),
        draw_pile_len: state.draw_pile_len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BotProfile, Rules};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use wildcard_protocol::{PlayerId, RoomCode};

    fn started_state() -> GameState {
        let mut gs =
            GameState::new(RoomCode::new("VIEWED"), Rules::default());
        gs.add_human(PlayerId(1)).unwrap();
        gs.add_human(PlayerId(2)).unwrap();
        gs.add_bot(BotProfile::named("Brook")).unwrap();
        gs.start(&mut StdRng::seed_from_u64(11)).unwrap();
        gs
    }

    #[test]
    fn test_only_the_recipients_hand_is_visible() {
        let gs = started_state();
        let view = project(&gs, Some(SeatIndex(1)));

        for (i, seat) in view.seats.iter().enumerate() {
            match &seat.cards {
                CardsView::Visible { cards } => {
                    assert_eq!(i, 1, "only seat 1 may be visible");
                    assert_eq!(cards, &gs.seats()[1].hand);
                }
                CardsView::Hidden { count } => {
                    assert_ne!(i, 1);
                    assert_eq!(*count, gs.seats()[i].hand.len());
                }
            }
        }
    }

    #[test]
    fn test_spectator_view_hides_every_hand() {
        let gs = started_state();
        let view = project(&gs, None);
        assert!(view
            .seats
            .iter()
            .all(|s| matches!(s.cards, CardsView::Hidden { .. })));
    }

    #[test]
    fn test_shared_state_is_identical_across_recipients() {
        let gs = started_state();
        let a = project(&gs, Some(SeatIndex(0)));
        let b = project(&gs, Some(SeatIndex(2)));

        assert_eq!(a.code, b.code);
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.turn, b.turn);
        assert_eq!(a.direction, b.direction);
        assert_eq!(a.top_discard, b.top_discard);
        assert_eq!(a.active_color, b.active_color);
        assert_eq!(a.pending_draw, b.pending_draw);
        assert_eq!(a.draw_pile_len, b.draw_pile_len);
    }

    #[test]
    fn test_bot_seats_project_display_name() {
        let gs = started_state();
        let view = project(&gs, Some(SeatIndex(0)));
        assert_eq!(
            view.seats[2].occupant,
            SeatOccupant::Bot { name: "Brook".into() }
        );
    }

    #[test]
    fn test_waiting_room_projects_without_piles() {
        let mut gs =
            GameState::new(RoomCode::new("LOBBY1"), Rules::default());
        gs.add_human(PlayerId(1)).unwrap();
        let view = project(&gs, Some(SeatIndex(0)));
        assert!(view.phase.is_waiting());
        assert_eq!(view.top_discard, None);
        assert_eq!(view.active_color, None);
        assert_eq!(view.draw_pile_len, 0);
    }
}
