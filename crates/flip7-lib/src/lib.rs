use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod card;
pub mod net;
pub mod player;
pub mod resolve;
pub mod room;
pub mod solo;

/// Every room seats exactly this many players before a game can begin.
pub const MAX_PLAYERS: usize = 3;

#[derive(Copy, Clone, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub struct PlayerId(pub u32);

impl Debug for PlayerId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

impl Display for PlayerId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Always display IDs in hex
        write!(f, "{:#X}", self.0)
    }
}

impl From<u32> for PlayerId {
    #[inline]
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<PlayerId> for u32 {
    #[inline]
    fn from(v: PlayerId) -> Self {
        v.0
    }
}

impl PartialEq<u32> for PlayerId {
    #[inline]
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

pub const ROOM_CODE_LEN: usize = 6;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Six uppercase alphanumeric characters identifying an open room.
///
/// Codes are short enough to read over voice chat; the server regenerates on
/// collision with a currently-active room.
#[derive(Copy, Clone, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub struct RoomCode([u8; ROOM_CODE_LEN]);

impl RoomCode {
    pub fn generate(rng: &mut impl Rng) -> Self {
        let mut code = [0u8; ROOM_CODE_LEN];
        for b in &mut code {
            *b = CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())];
        }
        Self(code)
    }
}

impl Debug for RoomCode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

impl Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidRoomCode;

impl Display for InvalidRoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room codes are {ROOM_CODE_LEN} uppercase letters or digits")
    }
}

impl std::error::Error for InvalidRoomCode {}

impl FromStr for RoomCode {
    type Err = InvalidRoomCode;

    /// Lowercase input is accepted and uppercased, matching the client's
    /// code-entry field. Codes are byte-per-character, so non-ASCII input
    /// can never be valid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ROOM_CODE_LEN || !s.is_ascii() {
            return Err(InvalidRoomCode);
        }
        let mut code = [0u8; ROOM_CODE_LEN];
        for (slot, b) in code.iter_mut().zip(s.bytes()) {
            let b = b.to_ascii_uppercase();
            if !CODE_ALPHABET.contains(&b) {
                return Err(InvalidRoomCode);
            }
            *slot = b;
        }
        Ok(Self(code))
    }
}
