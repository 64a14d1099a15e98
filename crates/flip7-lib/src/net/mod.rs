pub use error::{FrameError, ProtocolError};
pub use message::{Message, RoomCommand, RoomEvent, Winner};

pub mod connection;
mod error;
mod message;
