use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Total cards in a fresh deck: 1+2+..+7 number cards plus three specials.
pub const DECK_SIZE: usize = 31;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    Number,
    Bonus,
    SecondChance,
    Freeze,
}

/// A single card. Immutable for the duration of a game.
///
/// Number cards carry `value` in 1..=7; specials carry `value = 0` and are
/// distinguished by `kind` alone. The `id` is unique within one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub kind: CardKind,
    pub value: u8,
    pub id: String,
}

impl Card {
    fn number(value: u8, copy: u8) -> Self {
        Self {
            kind: CardKind::Number,
            value,
            id: format!("{value}-{copy}"),
        }
    }

    fn special(kind: CardKind, id: &str) -> Self {
        Self {
            kind,
            value: 0,
            id: id.to_owned(),
        }
    }
}

/// An ordered draw pile. Cards leave from the front and are never returned;
/// there is no mid-game reshuffle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// The canonical, unshuffled composition: `value` copies of each number
    /// card 1..=7, then one Bonus, one SecondChance, one Freeze.
    pub fn canonical() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for value in 1..=7 {
            for copy in 0..value {
                cards.push(Card::number(value, copy));
            }
        }
        cards.push(Card::special(CardKind::Bonus, "bonus-1"));
        cards.push(Card::special(CardKind::SecondChance, "second-1"));
        cards.push(Card::special(CardKind::Freeze, "freeze-1"));
        Self { cards }
    }

    /// Returns a uniformly permuted copy of this deck, leaving `self` intact.
    #[must_use]
    pub fn shuffled(&self, rng: &mut impl Rng) -> Self {
        let mut cards = self.cards.clone();
        cards.shuffle(rng);
        Self { cards }
    }

    /// Removes and returns the top card, or `None` once the deck is empty.
    pub fn draw(&mut self) -> Option<Card> {
        if self.cards.is_empty() {
            None
        } else {
            Some(self.cards.remove(0))
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Test rigging: a deck with exactly these cards, in this draw order.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn canonical_composition() {
        let deck = Deck::canonical();
        assert_eq!(deck.remaining(), DECK_SIZE);

        for value in 1..=7u8 {
            let copies = deck
                .cards()
                .iter()
                .filter(|c| c.kind == CardKind::Number && c.value == value)
                .count();
            assert_eq!(copies, value as usize, "wrong count for value {value}");
        }
        for kind in [CardKind::Bonus, CardKind::SecondChance, CardKind::Freeze] {
            let copies = deck.cards().iter().filter(|c| c.kind == kind).count();
            assert_eq!(copies, 1, "expected exactly one {kind:?}");
        }
    }

    #[test]
    fn card_ids_are_unique() {
        let deck = Deck::canonical();
        let mut ids: Vec<_> = deck.cards().iter().map(|c| c.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), DECK_SIZE);
    }

    #[test]
    fn shuffle_is_seeded_and_preserves_cards() {
        let deck = Deck::canonical();

        let a = deck.shuffled(&mut ChaCha8Rng::seed_from_u64(17));
        let b = deck.shuffled(&mut ChaCha8Rng::seed_from_u64(17));
        assert_eq!(a.cards(), b.cards());

        // Original untouched, permuted copy holds the same multiset
        assert_eq!(deck.cards(), Deck::canonical().cards());
        let mut sorted_ids: Vec<_> = a.cards().iter().map(|c| c.id.as_str()).collect();
        sorted_ids.sort_unstable();
        let mut canon_ids: Vec<_> = deck.cards().iter().map(|c| c.id.as_str()).collect();
        canon_ids.sort_unstable();
        assert_eq!(sorted_ids, canon_ids);
    }

    #[test]
    fn draw_exhausts_after_31_cards() {
        let mut deck = Deck::canonical().shuffled(&mut ChaCha8Rng::seed_from_u64(1));
        for drawn in 0..DECK_SIZE {
            assert_eq!(deck.remaining() + drawn, DECK_SIZE);
            assert!(deck.draw().is_some());
        }
        assert!(deck.draw().is_none());
        assert!(deck.is_empty());
    }
}
