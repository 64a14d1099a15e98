use crate::RoomCode;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("No room with code {0}")]
    RoomNotFound(RoomCode),
    #[error("Invalid Message")]
    InvalidMessage,
    #[error("Player disconnected")]
    Disconnected,
    #[error("Display names must be between 1 and 24 characters")]
    InvalidDisplayName,
    #[error("{0}")]
    Message(String),
}

impl From<FrameError> for ProtocolError {
    fn from(e: FrameError) -> Self {
        Self::Message(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame exceeded max length")]
    FrameLength,
    #[error("Connection reset by peer")]
    ConnectionReset,
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization Error: {0}")]
    Bincode(#[from] bincode::Error),
}
