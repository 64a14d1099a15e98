use crate::card::Card;
use crate::room::Room;
use crate::{PlayerId, RoomCode};
use serde::{Deserialize, Serialize};

use super::ProtocolError;

/// Everything that crosses the wire, in both directions.
///
/// A connection opens with `Register` and is answered with
/// `ConnectionAccept`, after which the client sends `CreateRoom` or
/// `JoinRoom` exactly once. From then on the client only sends
/// `Command` variants and the server only sends `Event` and `Error`
/// variants.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub enum Message {
    Error { error: ProtocolError },
    Register { display_name: String },
    ConnectionAccept { player_id: PlayerId },
    CreateRoom,
    JoinRoom { code: RoomCode },
    Command(RoomCommand),
    Event(RoomEvent),
}

impl From<RoomCommand> for Message {
    fn from(cmd: RoomCommand) -> Self {
        Self::Command(cmd)
    }
}

impl From<RoomEvent> for Message {
    fn from(event: RoomEvent) -> Self {
        Self::Event(event)
    }
}

/// In-room actions a seated player may attempt. The room actor re-validates
/// every one of these; client-side button disabling is cosmetic only.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum RoomCommand {
    Ready,
    FlipCard,
    BankPoints,
    EndTurn,
}

/// Authoritative notifications fanned out to every client of a room. Each
/// carries the full room snapshot; a rejected action produces no event.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub enum RoomEvent {
    JoinedRoom {
        code: RoomCode,
        player_id: PlayerId,
    },
    RoomUpdate {
        room: Room,
    },
    GameStart {
        room: Room,
    },
    CardFlipped {
        room: Room,
        drawn_card: Card,
        message: String,
    },
    PointsBanked {
        room: Room,
        message: String,
    },
    TurnChange {
        room: Room,
    },
    GameEnd {
        room: Room,
        winner: Winner,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Winner {
    pub player_id: PlayerId,
    pub display_name: String,
    pub final_score: u32,
}
