use std::time::Duration;

use flip7_lib::card::{CardKind, Deck};
use flip7_lib::net::{Message, RoomEvent, Winner};
use flip7_lib::player::Player;
use flip7_lib::resolve::{flip_message, resolve_flip};
use flip7_lib::room::{GameStatus, Room, FREEZE_TURNS};
use flip7_lib::{PlayerId, RoomCode, MAX_PLAYERS};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::instrument;

use crate::state::OwnedId;

use super::{RoomError, RoomResult};

/// A turn is forfeited when its player takes no action for this long, so an
/// absent player cannot stall the room.
pub const TURN_TIMEOUT: Duration = Duration::from_secs(60);

/// One actor task per room. All actions against a room funnel through its
/// mpsc receiver, so two racing clients can never interleave turns.
pub struct RoomActor {
    code: OwnedId<RoomCode>,
    receiver: mpsc::Receiver<RoomAction>,
    shared: Room,
    sender: broadcast::Sender<Message>,
    rng: ChaCha8Rng,
    turn_deadline: Option<Instant>,
}

#[derive(Debug)]
pub enum RoomAction {
    AddPlayer {
        respond_to: oneshot::Sender<RoomResult<broadcast::Receiver<Message>>>,
        id: PlayerId,
        display_name: String,
    },
    RemovePlayer {
        id: PlayerId,
    },
    SetReady {
        respond_to: oneshot::Sender<RoomResult<()>>,
        id: PlayerId,
    },
    FlipCard {
        respond_to: oneshot::Sender<RoomResult<()>>,
        id: PlayerId,
    },
    BankPoints {
        respond_to: oneshot::Sender<RoomResult<()>>,
        id: PlayerId,
    },
    EndTurn {
        respond_to: oneshot::Sender<RoomResult<()>>,
        id: PlayerId,
    },
}

impl RoomActor {
    pub fn new(receiver: mpsc::Receiver<RoomAction>, code: OwnedId<RoomCode>, seed: u64) -> Self {
        let (sender, _) = broadcast::channel(100);
        let shared = Room::new(*code);

        Self {
            code,
            receiver,
            shared,
            sender,
            rng: ChaCha8Rng::seed_from_u64(seed),
            turn_deadline: None,
        }
    }

    #[instrument(skip_all, fields(room = %self.shared.code))]
    pub async fn run(mut self) {
        tracing::info!("Room opened");
        loop {
            let action = if let (GameStatus::Playing, Some(deadline)) =
                (self.shared.status, self.turn_deadline)
            {
                tokio::select! {
                    action = self.receiver.recv() => match action {
                        Some(action) => action,
                        None => break,
                    },
                    _ = time::sleep_until(deadline) => {
                        self.forfeit_stalled_turn();
                        continue;
                    }
                }
            } else {
                match self.receiver.recv().await {
                    Some(action) => action,
                    None => break,
                }
            };

            match action {
                RoomAction::AddPlayer {
                    respond_to,
                    id,
                    display_name,
                } => {
                    let _ = respond_to.send(self.add_player(id, display_name));
                }
                RoomAction::RemovePlayer { id } => self.rem_player(id),
                RoomAction::SetReady { respond_to, id } => {
                    let _ = respond_to.send(self.set_ready(id));
                }
                RoomAction::FlipCard { respond_to, id } => {
                    let _ = respond_to.send(self.flip_card(id));
                }
                RoomAction::BankPoints { respond_to, id } => {
                    let _ = respond_to.send(self.bank_points(id));
                }
                RoomAction::EndTurn { respond_to, id } => {
                    let _ = respond_to.send(self.end_turn(id));
                }
            }
        }

        tracing::info!("Room {} closed", *self.code);
    }

    fn send_event(&self, event: RoomEvent) {
        let _ = self.sender.send(event.into());
    }

    fn send_room_update(&self) {
        self.send_event(RoomEvent::RoomUpdate {
            room: self.shared.clone(),
        });
    }
}

// ----------------------------------------------------------------------------
// Message Handlers
// ----------------------------------------------------------------------------
impl RoomActor {
    /// Seats a new player. The returned `[broadcast::Receiver]` will be sent
    /// every future event that happens to this room.
    ///
    /// # Errors
    ///
    /// Fails with [`RoomError::RoomFull`] when all seats are taken and
    /// [`RoomError::NotJoinable`] once the game has started.
    #[instrument(skip(self, display_name))]
    fn add_player(
        &mut self,
        player_id: PlayerId,
        display_name: String,
    ) -> RoomResult<broadcast::Receiver<Message>> {
        if self.shared.status != GameStatus::Waiting {
            return Err(RoomError::NotJoinable);
        }
        if self.shared.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull);
        }

        self.shared.players.push(Player::new(player_id, display_name));
        tracing::info!("Player joined room");

        // Subscribe early so that this player will receive the update that seats them
        let recv = self.sender.subscribe();
        self.send_event(RoomEvent::JoinedRoom {
            code: self.shared.code,
            player_id,
        });
        self.send_room_update();

        Ok(recv)
    }

    /// Removes a player. A departing player's turn ends immediately; the room
    /// closes once the last seat empties.
    #[instrument(skip(self))]
    fn rem_player(&mut self, player_id: PlayerId) {
        let Some(idx) = self.shared.players.iter().position(|p| p.id == player_id) else {
            tracing::warn!("Attempted to remove player who is not seated");
            return;
        };
        self.shared.players.remove(idx);
        tracing::info!("Player left room");

        // Close the room after the last player leaves by closing our receiver.
        // This will cause the run loop to consume all remaining messages,
        // (likely none since the last player just left), and then exit
        if self.shared.players.is_empty() {
            self.receiver.close();
            return;
        }

        if self.shared.status == GameStatus::Playing {
            let was_current = idx == self.shared.current_turn;
            if idx < self.shared.current_turn {
                self.shared.current_turn -= 1;
            } else if self.shared.current_turn >= self.shared.players.len() {
                self.shared.current_turn = 0;
            }
            if was_current {
                // The seat shift put the next player at the current index
                self.settle_turn();
            }
        }

        self.send_room_update();
    }

    #[instrument(skip(self))]
    fn set_ready(&mut self, player_id: PlayerId) -> RoomResult<()> {
        if self.shared.status != GameStatus::Waiting {
            tracing::warn!("Ready received for a game already underway");
            return Ok(());
        }
        let player = self
            .shared
            .player_mut(player_id)
            .ok_or(RoomError::PlayerInvalid(player_id))?;

        player.is_ready = true;
        tracing::info!("Player is ready to start");
        self.send_room_update();

        if self.shared.can_start() {
            self.start_game();
        }
        Ok(())
    }

    fn start_game(&mut self) {
        self.shared.deck = Deck::canonical().shuffled(&mut self.rng);
        self.shared.status = GameStatus::Playing;
        self.shared.current_turn = 0;
        self.shared.round_number = 1;
        self.turn_deadline = Some(Instant::now() + TURN_TIMEOUT);
        tracing::info!("Game started");
        self.send_event(RoomEvent::GameStart {
            room: self.shared.clone(),
        });
    }

    /// Draws the top card for the acting player and resolves it. A bust ends
    /// the turn with the round score forfeited; any other result leaves the
    /// turn open for another flip or a bank.
    #[instrument(skip(self))]
    fn flip_card(&mut self, player_id: PlayerId) -> RoomResult<()> {
        if self.shared.status != GameStatus::Playing {
            return Err(RoomError::NotPlaying);
        }
        let turn_idx = self.shared.current_turn;
        if self.shared.player(player_id).is_none() {
            return Err(RoomError::PlayerInvalid(player_id));
        }
        if self.shared.players.get(turn_idx).map(|p| p.id) != Some(player_id) {
            return Err(RoomError::NotYourTurn);
        }
        let card = match self.shared.deck.draw() {
            Some(card) => card,
            None => return Err(RoomError::DeckEmpty),
        };

        let outcome = resolve_flip(&mut self.shared.players[turn_idx], card.clone());
        let mut message = flip_message(&self.shared.players[turn_idx], &card, &outcome);

        if card.kind == CardKind::Freeze {
            // Freeze lands on the next player in turn order
            let target_idx = (turn_idx + 1) % self.shared.players.len();
            if target_idx != turn_idx {
                let drawer = self.shared.players[turn_idx].display_name.clone();
                let target = &mut self.shared.players[target_idx];
                target.is_frozen = true;
                target.freeze_turns_left = FREEZE_TURNS;
                message = format!("{drawer} froze {}!", target.display_name);
                if outcome.seven_card_bonus {
                    message.push_str(" 7 CARDS BONUS! +10 points!");
                }
            }
        }

        tracing::info!(%message);
        self.send_event(RoomEvent::CardFlipped {
            room: self.shared.clone(),
            drawn_card: card,
            message,
        });

        if outcome.busted {
            // The round score is forfeited and the turn passes on
            self.shared.players[turn_idx].reset_round();
            self.advance_turn();
        } else {
            self.turn_deadline = Some(Instant::now() + TURN_TIMEOUT);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn bank_points(&mut self, player_id: PlayerId) -> RoomResult<()> {
        if self.shared.status != GameStatus::Playing {
            return Err(RoomError::NotPlaying);
        }
        let turn_idx = self.shared.current_turn;
        if self.shared.player(player_id).is_none() {
            return Err(RoomError::PlayerInvalid(player_id));
        }
        if self.shared.players.get(turn_idx).map(|p| p.id) != Some(player_id) {
            return Err(RoomError::NotYourTurn);
        }
        if self.shared.players[turn_idx].round_score == 0 {
            return Err(RoomError::NothingToBank);
        }

        let banked = self.shared.players[turn_idx].bank();
        let player = &self.shared.players[turn_idx];
        let message = format!(
            "{} banked {banked} points! Total: {}",
            player.display_name, player.total_score
        );
        tracing::info!(%message);
        self.send_event(RoomEvent::PointsBanked {
            room: self.shared.clone(),
            message,
        });

        self.advance_turn();
        Ok(())
    }

    /// Ends the turn without banking. The unbanked round score survives into
    /// the player's next turn; only a bank or a bust clears it.
    #[instrument(skip(self))]
    fn end_turn(&mut self, player_id: PlayerId) -> RoomResult<()> {
        if self.shared.status != GameStatus::Playing {
            return Err(RoomError::NotPlaying);
        }
        let turn_idx = self.shared.current_turn;
        if self.shared.player(player_id).is_none() {
            return Err(RoomError::PlayerInvalid(player_id));
        }
        if self.shared.players.get(turn_idx).map(|p| p.id) != Some(player_id) {
            return Err(RoomError::NotYourTurn);
        }

        self.advance_turn();
        Ok(())
    }

    fn forfeit_stalled_turn(&mut self) {
        let idx = self.shared.current_turn;
        if let Some(player) = self.shared.players.get_mut(idx) {
            tracing::warn!(player = %player.id, "Turn timed out; round score forfeited");
            player.reset_round();
        }
        self.advance_turn();
    }

    fn advance_turn(&mut self) {
        if self.step_turn() {
            return;
        }
        self.settle_turn();
    }

    /// Skips frozen seats starting from the current one, spending one freeze
    /// turn per skip, then announces whose turn it is. Every skip decrements
    /// some counter, so this terminates even when all seats are frozen.
    fn settle_turn(&mut self) {
        while self.shared.players[self.shared.current_turn].freeze_turns_left > 0 {
            let player = &mut self.shared.players[self.shared.current_turn];
            player.freeze_turns_left -= 1;
            if player.freeze_turns_left == 0 {
                player.is_frozen = false;
            }
            if self.step_turn() {
                return;
            }
        }
        self.turn_deadline = Some(Instant::now() + TURN_TIMEOUT);
        self.send_event(RoomEvent::TurnChange {
            room: self.shared.clone(),
        });
    }

    /// Moves to the next seat. Wrapping back to seat 0 is the round boundary;
    /// returns true when that wrap finished the game.
    fn step_turn(&mut self) -> bool {
        self.shared.current_turn += 1;
        if self.shared.current_turn >= self.shared.players.len() {
            self.shared.current_turn = 0;
            self.shared.round_number += 1;
            if self.shared.round_number > self.shared.max_rounds {
                self.finish_game();
                return true;
            }
        }
        false
    }

    fn finish_game(&mut self) {
        self.shared.status = GameStatus::Finished;
        self.turn_deadline = None;

        let Some(leader) = self.shared.leader() else {
            return;
        };
        let winner = Winner {
            player_id: leader.id,
            display_name: leader.display_name.clone(),
            final_score: leader.total_score,
        };
        tracing::info!(winner = %winner.display_name, score = winner.final_score, "Game over");
        self.send_event(RoomEvent::GameEnd {
            room: self.shared.clone(),
            winner,
        });
    }
}
