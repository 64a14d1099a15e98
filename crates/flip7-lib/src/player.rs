use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::PlayerId;

/// Per-player state for one seated player.
///
/// Round-scoped fields (`flipped_cards`, `flipped_numbers`, `round_score`,
/// `is_busted`) are cleared by [`reset_round`](Self::reset_round). Second
/// chance and freeze state deliberately survive a round reset; they only
/// clear on a full game restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub total_score: u32,
    pub round_score: u32,
    pub flipped_cards: Vec<Card>,
    pub flipped_numbers: BTreeSet<u8>,
    pub has_second_chance: bool,
    pub is_frozen: bool,
    pub freeze_turns_left: u8,
    pub is_busted: bool,
    pub is_ready: bool,
}

impl Player {
    pub fn new(id: PlayerId, display_name: String) -> Self {
        Self {
            id,
            display_name,
            total_score: 0,
            round_score: 0,
            flipped_cards: Vec::new(),
            flipped_numbers: BTreeSet::new(),
            has_second_chance: false,
            is_frozen: false,
            freeze_turns_left: 0,
            is_busted: false,
            is_ready: false,
        }
    }

    pub fn reset_round(&mut self) {
        self.flipped_cards.clear();
        self.flipped_numbers.clear();
        self.round_score = 0;
        self.is_busted = false;
    }

    /// Commits the round score into the running total and resets the round.
    /// Returns the amount banked; banking a zero round score changes nothing
    /// and returns 0 (the caller reports that as a user error).
    pub fn bank(&mut self) -> u32 {
        if self.round_score == 0 {
            return 0;
        }
        let banked = self.round_score;
        self.total_score += banked;
        self.reset_round();
        banked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, CardKind};

    fn sample_player() -> Player {
        Player::new(1.into(), "Maya".to_owned())
    }

    #[test]
    fn bank_commits_and_resets() {
        let mut p = sample_player();
        p.total_score = 10;
        p.round_score = 45;
        p.flipped_numbers.insert(3);
        p.flipped_cards.push(Card {
            kind: CardKind::Number,
            value: 3,
            id: "3-0".into(),
        });

        assert_eq!(p.bank(), 45);
        assert_eq!(p.total_score, 55);
        assert_eq!(p.round_score, 0);
        assert!(p.flipped_cards.is_empty());
        assert!(p.flipped_numbers.is_empty());
    }

    #[test]
    fn bank_with_zero_round_score_is_a_no_op() {
        let mut p = sample_player();
        p.total_score = 10;
        p.flipped_numbers.insert(4);

        assert_eq!(p.bank(), 0);
        assert_eq!(p.total_score, 10);
        // No round reset either
        assert!(p.flipped_numbers.contains(&4));
    }

    #[test]
    fn reset_round_keeps_second_chance_and_freeze() {
        let mut p = sample_player();
        p.round_score = 12;
        p.is_busted = true;
        p.has_second_chance = true;
        p.is_frozen = true;
        p.freeze_turns_left = 1;

        p.reset_round();
        assert_eq!(p.round_score, 0);
        assert!(!p.is_busted);
        assert!(p.has_second_chance);
        assert!(p.is_frozen);
        assert_eq!(p.freeze_turns_left, 1);
    }
}
