//! Local single-player driver.
//!
//! Runs the same deck and resolver as the networked rooms against a single
//! player. Freeze cards have no gameplay effect here; they are recorded and
//! shown, nothing more.

use thiserror::Error;

use crate::card::{Card, Deck};
use crate::player::Player;
use crate::resolve::{resolve_flip, FlipOutcome};
use crate::PlayerId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SoloError {
    #[error("the deck is empty")]
    DeckEmpty,
    #[error("the round ended in a bust; start a new round")]
    Busted,
    #[error("no points to bank")]
    NothingToBank,
}

#[derive(Debug, Clone)]
pub struct SoloGame {
    deck: Deck,
    player: Player,
    last_card: Option<Card>,
    seed: u64,
}

impl SoloGame {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        Self {
            deck: Deck::canonical().shuffled(&mut rng),
            player: Player::new(PlayerId(0), "You".to_owned()),
            last_card: None,
            seed,
        }
    }

    /// Draws the top card and resolves it. Rejected once the round has busted
    /// or the deck is exhausted; neither rejection changes any state.
    pub fn flip(&mut self) -> Result<(Card, FlipOutcome), SoloError> {
        if self.player.is_busted {
            return Err(SoloError::Busted);
        }
        let card = self.deck.draw().ok_or(SoloError::DeckEmpty)?;
        let outcome = resolve_flip(&mut self.player, card.clone());
        self.last_card = Some(card.clone());
        Ok((card, outcome))
    }

    /// Banks the round score into the total and starts a new round. A busted
    /// round has forfeited its score and cannot be banked.
    pub fn bank(&mut self) -> Result<u32, SoloError> {
        if self.player.is_busted {
            return Err(SoloError::Busted);
        }
        if self.player.round_score == 0 {
            return Err(SoloError::NothingToBank);
        }
        self.last_card = None;
        Ok(self.player.bank())
    }

    /// Clears the round (forfeiting any unbanked score) and continues against
    /// the same deck.
    pub fn next_round(&mut self) {
        self.player.reset_round();
        self.last_card = None;
    }

    /// Full restart: fresh shuffled deck, all scores and flags cleared.
    pub fn restart(&mut self) {
        *self = Self::new(self.seed.wrapping_add(1));
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn last_card(&self) -> Option<&Card> {
        self.last_card.as_ref()
    }
}
