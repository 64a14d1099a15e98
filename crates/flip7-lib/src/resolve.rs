//! The card resolver: applies one drawn card to one player.
//!
//! Both the local single-player driver and the networked room actor resolve
//! flips through [`resolve_flip`], so the rules cannot drift between the two.
//! Freeze targeting is a turn-order concern and is left to the caller; the
//! resolver only records the card against the drawer.

use crate::card::{Card, CardKind};
use crate::player::Player;

/// A round is worth an extra 10 points the instant it reaches 7 cards.
pub const FLIP_SEVEN_COUNT: usize = 7;
pub const SEVEN_CARD_BONUS: u32 = 10;
pub const BONUS_POINTS: u32 = 1;

/// What happened when a card was resolved against a player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlipOutcome {
    pub busted: bool,
    pub bonus_applied: bool,
    pub used_second_chance: bool,
    pub seven_card_bonus: bool,
}

/// Resolves `card` against `player`, mutating the player's round state.
///
/// A duplicate number busts unless the player holds a Second Chance, which is
/// consumed to absorb the duplicate (card kept, no points). The 7-card bonus
/// counts cards of every kind and fires exactly once, when the seventh card
/// of the round lands.
pub fn resolve_flip(player: &mut Player, card: Card) -> FlipOutcome {
    let mut outcome = FlipOutcome::default();

    match card.kind {
        CardKind::Number => {
            if player.flipped_numbers.contains(&card.value) {
                if player.has_second_chance {
                    player.has_second_chance = false;
                    player.flipped_cards.push(card);
                    outcome.used_second_chance = true;
                } else {
                    player.is_busted = true;
                    outcome.busted = true;
                    return outcome;
                }
            } else {
                player.flipped_numbers.insert(card.value);
                player.round_score += u32::from(card.value);
                player.flipped_cards.push(card);
            }
        }
        CardKind::Bonus => {
            player.round_score += BONUS_POINTS;
            player.flipped_cards.push(card);
            outcome.bonus_applied = true;
        }
        CardKind::SecondChance => {
            // Re-drawing while one is held keeps the single charge; it never
            // stacks.
            player.has_second_chance = true;
            player.flipped_cards.push(card);
        }
        CardKind::Freeze => {
            // Recorded against the drawer; the caller decides who it freezes.
            player.flipped_cards.push(card);
        }
    }

    if player.flipped_cards.len() == FLIP_SEVEN_COUNT {
        player.round_score += SEVEN_CARD_BONUS;
        outcome.seven_card_bonus = true;
    }

    outcome
}

/// The announcement string shown to every client after a flip, phrased like
/// the game board's toasts.
pub fn flip_message(player: &Player, card: &Card, outcome: &FlipOutcome) -> String {
    let name = &player.display_name;
    let mut message = if outcome.busted {
        format!("BUST! {name} drew {} again. Round over.", card.value)
    } else if outcome.used_second_chance {
        format!(
            "Second Chance used! {name} drew {} again but is safe!",
            card.value
        )
    } else {
        match card.kind {
            CardKind::Number => format!(
                "{name} drew {}! Round score: {}",
                card.value, player.round_score
            ),
            CardKind::Bonus => format!("{name} drew +1 Bonus Point!"),
            CardKind::SecondChance => format!("{name} acquired a Second Chance!"),
            CardKind::Freeze => format!("{name} drew a Freeze card!"),
        }
    };
    if outcome.seven_card_bonus {
        message.push_str(" 7 CARDS BONUS! +10 points!");
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Deck;
    use crate::player::Player;

    fn player() -> Player {
        Player::new(1.into(), "Maya".to_owned())
    }

    fn number(value: u8) -> Card {
        Card {
            kind: CardKind::Number,
            value,
            id: format!("{value}-t"),
        }
    }

    fn special(kind: CardKind, id: &str) -> Card {
        Card {
            kind,
            value: 0,
            id: id.to_owned(),
        }
    }

    #[test]
    fn fresh_number_scores_its_value() {
        let mut p = player();
        let outcome = resolve_flip(&mut p, number(5));

        assert_eq!(outcome, FlipOutcome::default());
        assert_eq!(p.round_score, 5);
        assert!(p.flipped_numbers.contains(&5));
        assert_eq!(p.flipped_cards.len(), 1);
    }

    #[test]
    fn duplicate_without_second_chance_busts() {
        let mut p = player();
        resolve_flip(&mut p, number(3));
        resolve_flip(&mut p, number(5));
        let before = p.round_score;

        let outcome = resolve_flip(&mut p, number(3));
        assert!(outcome.busted);
        assert!(p.is_busted);
        assert_eq!(p.round_score, before);
        // The busting card is not kept
        assert_eq!(p.flipped_cards.len(), 2);
    }

    #[test]
    fn duplicate_with_second_chance_is_absorbed() {
        let mut p = player();
        resolve_flip(&mut p, number(3));
        resolve_flip(&mut p, number(5));
        p.has_second_chance = true;
        let before = p.round_score;

        let outcome = resolve_flip(&mut p, number(3));
        assert!(!outcome.busted);
        assert!(outcome.used_second_chance);
        assert!(!p.is_busted);
        assert!(!p.has_second_chance);
        assert_eq!(p.round_score, before);
        // Absorbed duplicate is kept but not re-counted
        assert_eq!(p.flipped_cards.len(), 3);
        assert_eq!(p.flipped_numbers.len(), 2);
    }

    #[test]
    fn bonus_card_adds_one_and_never_busts() {
        let mut p = player();
        resolve_flip(&mut p, special(CardKind::Bonus, "bonus-1"));
        let outcome = resolve_flip(&mut p, special(CardKind::Bonus, "bonus-2"));

        assert!(outcome.bonus_applied);
        assert!(!outcome.busted);
        assert_eq!(p.round_score, 2);
    }

    #[test]
    fn second_chance_does_not_stack() {
        let mut p = player();
        resolve_flip(&mut p, special(CardKind::SecondChance, "second-1"));
        assert!(p.has_second_chance);

        resolve_flip(&mut p, special(CardKind::SecondChance, "second-2"));
        assert!(p.has_second_chance);

        // One charge absorbs one duplicate, then it's gone
        resolve_flip(&mut p, number(4));
        let absorbed = resolve_flip(&mut p, number(4));
        assert!(absorbed.used_second_chance);
        let busted = resolve_flip(&mut p, number(4));
        assert!(busted.busted);
    }

    #[test]
    fn freeze_is_recorded_without_scoring() {
        let mut p = player();
        let outcome = resolve_flip(&mut p, special(CardKind::Freeze, "freeze-1"));

        assert_eq!(outcome, FlipOutcome::default());
        assert_eq!(p.round_score, 0);
        assert_eq!(p.flipped_cards.len(), 1);
        // The drawer is never frozen by their own card
        assert!(!p.is_frozen);
    }

    #[test]
    fn seventh_card_awards_flat_bonus_once() {
        // Six distinct numbers, then a bonus card lands as the 7th card
        let mut p = player();
        for value in [1, 2, 3, 4, 5, 6] {
            let outcome = resolve_flip(&mut p, number(value));
            assert!(!outcome.seven_card_bonus);
        }
        assert_eq!(p.round_score, 21);

        let outcome = resolve_flip(&mut p, special(CardKind::Bonus, "bonus-1"));
        assert!(outcome.bonus_applied);
        assert!(outcome.seven_card_bonus);
        assert_eq!(p.round_score, 21 + BONUS_POINTS + SEVEN_CARD_BONUS);

        // An eighth card must not re-trigger the bonus
        let eighth = resolve_flip(&mut p, number(7));
        assert!(!eighth.seven_card_bonus);
        assert_eq!(p.round_score, 32 + 7);
    }

    #[test]
    fn deck_invariant_holds_while_drawing() {
        use rand::SeedableRng;
        let mut deck = Deck::canonical().shuffled(&mut rand_chacha::ChaCha8Rng::seed_from_u64(3));
        let mut drawn = 0;
        while let Some(_card) = deck.draw() {
            drawn += 1;
            assert_eq!(deck.remaining() + drawn, crate::card::DECK_SIZE);
        }
        assert_eq!(drawn, crate::card::DECK_SIZE);
    }

    #[test]
    fn flip_messages_read_like_the_board() {
        let mut p = player();
        let card = number(3);
        let outcome = resolve_flip(&mut p, card.clone());
        assert_eq!(
            flip_message(&p, &card, &outcome),
            "Maya drew 3! Round score: 3"
        );

        let outcome = resolve_flip(&mut p, card.clone());
        assert_eq!(
            flip_message(&p, &card, &outcome),
            "BUST! Maya drew 3 again. Round over."
        );
    }
}
