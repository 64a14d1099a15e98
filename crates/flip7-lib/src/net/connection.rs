//! Length-prefixed bincode framing over a TCP stream.
//!
//! Each frame is a big-endian `u16` length followed by one bincode-encoded
//! [`Message`]. Frames are capped at `u16::MAX` bytes, which comfortably
//! holds a full room snapshot.

use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::{io::AsyncReadExt, io::AsyncWriteExt, io::BufWriter, net::TcpStream};

use super::{FrameError, Message};

pub fn from_socket(socket: TcpStream) -> (ConnectionTx, ConnectionRx) {
    let (read_stream, write_stream) = socket.into_split();

    (
        ConnectionTx {
            write_stream: BufWriter::new(write_stream),
        },
        ConnectionRx {
            read_stream,
            buffer: BytesMut::with_capacity(256),
        },
    )
}

#[derive(Debug)]
pub struct ConnectionTx {
    write_stream: BufWriter<OwnedWriteHalf>,
}

#[derive(Debug)]
pub struct ConnectionRx {
    read_stream: OwnedReadHalf,
    buffer: BytesMut,
}

impl ConnectionTx {
    pub async fn write_frame(&mut self, frame: Message) -> Result<(), FrameError> {
        let mut bytes: Bytes = bincode::serialize(&frame)?.into();
        if bytes.len() > u16::MAX.into() {
            return Err(FrameError::FrameLength);
        }
        let len = (bytes.len() as u16).to_be_bytes();
        self.write_stream.write_all(&len).await?;
        self.write_stream.write_buf(&mut bytes).await?;
        self.write_stream.flush().await?;
        Ok(())
    }
}

impl ConnectionRx {
    /// Reads the next message, or `None` once the peer closes cleanly.
    pub async fn read_frame(&mut self) -> Result<Option<Message>, FrameError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            if self.read_stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    // Remote closed connection
                    return Ok(None);
                } else {
                    // Connection closed while still sending data
                    return Err(FrameError::ConnectionReset);
                }
            }
        }
    }

    fn parse_frame(&mut self) -> Result<Option<Message>, FrameError> {
        if self.buffer.len() < std::mem::size_of::<u16>() {
            return Ok(None);
        }

        // Use a Cursor to avoid advancing the internal cursor of self.buffer
        let mut buf = Cursor::new(&self.buffer[..]);
        let message_len: usize = buf.get_u16().into();
        if self.buffer.remaining() < message_len + std::mem::size_of::<u16>() {
            return Ok(None);
        }

        // Consume the frame from the buffer and deserialize a message
        self.buffer.advance(std::mem::size_of::<u16>());
        let message = bincode::deserialize::<Message>(&self.buffer)?;
        self.buffer.advance(message_len);

        tracing::trace!(len = message_len, "Frame received");
        Ok(Some(message))
    }
}
