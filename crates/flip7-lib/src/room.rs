use serde::{Deserialize, Serialize};

use crate::card::Deck;
use crate::player::Player;
use crate::{PlayerId, RoomCode, MAX_PLAYERS};

/// How many turns a frozen player sits out.
pub const FREEZE_TURNS: u8 = 1;

/// Rounds played before the game ends and a winner is declared.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

/// The authoritative state of one multiplayer session. This is the snapshot
/// broadcast to every connected client after each successful transition;
/// clients render it and never compute outcomes themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub code: RoomCode,
    pub players: Vec<Player>,
    pub deck: Deck,
    pub current_turn: usize,
    pub status: GameStatus,
    pub round_number: u32,
    pub max_rounds: u32,
}

impl Room {
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            players: Vec::with_capacity(MAX_PLAYERS),
            deck: Deck::default(),
            current_turn: 0,
            status: GameStatus::Waiting,
            round_number: 0,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// True when every seat is filled and every seated player is ready.
    pub fn can_start(&self) -> bool {
        self.players.len() == MAX_PLAYERS && self.players.iter().all(|p| p.is_ready)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_turn)
    }

    /// The player with the strictly highest total score; ties break toward
    /// the earliest seat.
    pub fn leader(&self) -> Option<&Player> {
        let mut best: Option<&Player> = None;
        for p in &self.players {
            if best.map_or(true, |b| p.total_score > b.total_score) {
                best = Some(p);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;

    fn room_with(count: usize) -> Room {
        let mut room = Room::new("AAAAAA".parse().unwrap());
        for i in 0..count {
            room.players
                .push(Player::new((i as u32).into(), format!("p{i}")));
        }
        room
    }

    #[test]
    fn can_start_requires_three_ready_players() {
        let mut room = room_with(2);
        room.players.iter_mut().for_each(|p| p.is_ready = true);
        assert!(!room.can_start());

        room.players.push(Player::new(2.into(), "p2".to_owned()));
        assert!(!room.can_start());

        room.players[2].is_ready = true;
        assert!(room.can_start());
    }

    #[test]
    fn leader_ties_break_toward_earliest_seat() {
        let mut room = room_with(3);
        room.players[0].total_score = 40;
        room.players[1].total_score = 55;
        room.players[2].total_score = 55;

        assert_eq!(room.leader().unwrap().id, 1);
    }
}
