use flip7_lib::net::ProtocolError;
use flip7_lib::{PlayerId, RoomCode};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::state::OwnedId;

use self::{
    room_actor::RoomActor,
    room_handle::{RoomHandle, RoomHandleProvider},
};

mod room_actor;
pub mod room_handle;

/// Everything a room can refuse to do. Join-time failures are validation
/// errors, the rest are attempts to act out of phase or out of turn; none of
/// them mutates the room.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("Attempted to join a full room")]
    RoomFull,
    #[error("The room is no longer accepting players")]
    NotJoinable,
    #[error("The game is not in progress")]
    NotPlaying,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Player {0:#} is not seated in this room")]
    PlayerInvalid(PlayerId),
    #[error("No points to bank")]
    NothingToBank,
    #[error("The deck is empty")]
    DeckEmpty,
    #[error("The room handle is no longer connected to a room")]
    HandleInvalid,
}

impl From<RoomError> for ProtocolError {
    fn from(v: RoomError) -> Self {
        Self::Message(v.to_string())
    }
}

pub type RoomResult<T> = Result<T, RoomError>;

pub fn start_new_room(
    code: OwnedId<RoomCode>,
    creator_id: PlayerId,
) -> (RoomHandleProvider, RoomHandle) {
    let (sender, receiver) = mpsc::channel(64);
    let weak_sender = sender.downgrade();
    let actor = RoomActor::new(receiver, code, rand::random());
    let handle = RoomHandle {
        sender,
        player_id: creator_id,
    };
    tokio::spawn(actor.run());

    (
        RoomHandleProvider {
            sender: weak_sender,
        },
        handle,
    )
}
