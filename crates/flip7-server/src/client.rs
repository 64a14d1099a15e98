use flip7_lib::net::connection::{self, ConnectionRx, ConnectionTx};
use flip7_lib::net::{Message, ProtocolError, RoomCommand};
use flip7_lib::PlayerId;
use tokio::net::TcpStream;
use tokio::select;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::room::room_handle::RoomHandle;
use crate::room::RoomError;
use crate::state::{OwnedId, ServerState};

const MAX_NAME_LEN: usize = 24;

/// Take a socket for a newly connected client and begin serving it.
pub async fn handle_new_connection(state: ServerState, socket: TcpStream) {
    let client = match ConnectingClient::new(state, socket).handshake().await {
        Some(c) => c,
        None => return,
    };
    client.run().await;
}

/// Represents a client who just connected and still needs to tell the server what they want to do.
struct ConnectingClient {
    state: ServerState,
    player_id: OwnedId<PlayerId>,
    conn_tx: ConnectionTx,
    conn_rx: ConnectionRx,
}

impl ConnectingClient {
    fn new(state: ServerState, socket: TcpStream) -> Self {
        let player_id = state.add_player();
        let (conn_tx, conn_rx) = connection::from_socket(socket);
        Self {
            state,
            player_id,
            conn_tx,
            conn_rx,
        }
    }

    async fn handshake(mut self) -> Option<PlayerClient> {
        match self.try_handshake().await {
            Ok((room_handle, room_recv)) => {
                Some(PlayerClient::from_connecting(self, room_handle, room_recv))
            }
            Err(error) => {
                tracing::error!(%error);
                let _ = self.conn_tx.write_frame(Message::Error { error }).await;
                None
            }
        }
    }

    /// Drives the connection to the point where the client is seated in a
    /// room. The client registers a display name, learns its id, then either
    /// opens a fresh room or joins one by code.
    async fn try_handshake(
        &mut self,
    ) -> Result<(RoomHandle, broadcast::Receiver<Message>), ProtocolError> {
        let display_name = match self.conn_rx.read_frame().await? {
            Some(Message::Register { display_name }) => display_name,
            Some(_) => return Err(ProtocolError::InvalidMessage),
            None => return Err(ProtocolError::Disconnected),
        };
        let display_name = validate_display_name(&display_name)?;

        // Inform player of their PlayerId
        self.conn_tx
            .write_frame(Message::ConnectionAccept {
                player_id: *self.player_id,
            })
            .await?;
        tracing::info!("New connection for player id {} opened", *self.player_id);

        let room_handle = match self.conn_rx.read_frame().await? {
            Some(Message::CreateRoom) => self.state.open_room(*self.player_id),
            Some(Message::JoinRoom { code }) => self
                .state
                .get_room_handle_provider(code)?
                .into_handle(*self.player_id)?,
            Some(_) => return Err(ProtocolError::InvalidMessage),
            None => return Err(ProtocolError::Disconnected),
        };

        let room_recv = room_handle
            .join_room(display_name)
            .await
            .map_err(|err| ProtocolError::Message(err.to_string()))?;
        Ok((room_handle, room_recv))
    }
}

fn validate_display_name(name: &str) -> Result<String, ProtocolError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ProtocolError::InvalidDisplayName);
    }
    Ok(name.to_owned())
}

async fn send_task(
    mut conn_tx: ConnectionTx,
    mut room_rx: broadcast::Receiver<Message>,
    mut local_rx: mpsc::Receiver<Message>,
) {
    loop {
        let m = select! {
            Ok(m) = room_rx.recv() => m,
            Some(m) = local_rx.recv() => m,
            else => return,
        };

        if conn_tx.write_frame(m).await.is_err() {
            return;
        }
    }
}

/// Used to represent a client who is seated in a room.
struct PlayerClient {
    player_id: OwnedId<PlayerId>,
    conn_rx: ConnectionRx,
    local_tx: mpsc::Sender<Message>,
    task_handle: JoinHandle<()>,
    room_handle: RoomHandle,
}

impl PlayerClient {
    fn from_connecting(
        client: ConnectingClient,
        room_handle: RoomHandle,
        room_recv: broadcast::Receiver<Message>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let task_handle = tokio::spawn(send_task(client.conn_tx, room_recv, rx));

        PlayerClient {
            player_id: client.player_id,
            conn_rx: client.conn_rx,
            local_tx: tx,
            task_handle,
            room_handle,
        }
    }

    /// Takes ownership of self to guarantee that client will be dropped when it's
    /// message loop ends
    #[instrument(skip_all, fields(player_id = %self.player_id))]
    async fn run(mut self) {
        loop {
            let incoming = match self.conn_rx.read_frame().await {
                Ok(Some(Message::Command(x))) => x,
                Ok(Some(m)) => {
                    tracing::error!("Invalid message received: {m:?}");
                    let _ = self
                        .local_tx
                        .send(Message::Error {
                            error: ProtocolError::InvalidMessage,
                        })
                        .await;
                    continue;
                }
                Ok(None) => {
                    break;
                }
                Err(e) => {
                    tracing::error!("Error reading message, Closing connection\n{e:?}");
                    break;
                }
            };

            tracing::debug!("Received command: {incoming:?}");
            match self.process(incoming).await {
                Ok(()) => (),
                Err(e) => {
                    tracing::error!("Encountered error processing command: {e:?}");
                    let _ = self
                        .local_tx
                        .send(Message::Error {
                            error: ProtocolError::Message(e.to_string()),
                        })
                        .await;
                }
            }
        }
        tracing::info!("Player disconnected");
    }

    async fn process(&mut self, cmd: RoomCommand) -> Result<(), RoomError> {
        match cmd {
            RoomCommand::Ready => self.room_handle.set_ready().await,
            RoomCommand::FlipCard => self.room_handle.flip_card().await,
            RoomCommand::BankPoints => self.room_handle.bank_points().await,
            RoomCommand::EndTurn => self.room_handle.end_turn().await,
        }
    }
}

impl Drop for PlayerClient {
    fn drop(&mut self) {
        // Dropping room_handle afterwards notifies the room, and dropping
        // player_id releases the id for reuse.
        self.task_handle.abort();
    }
}

#[cfg(test)]
mod test {
    use flip7_lib::net::ProtocolError;

    use super::validate_display_name;

    #[test]
    fn display_names_are_trimmed() {
        assert_eq!(validate_display_name("  fred  ").unwrap(), "fred");
    }

    #[test]
    fn blank_display_names_are_rejected() {
        assert_eq!(
            validate_display_name("   "),
            Err(ProtocolError::InvalidDisplayName)
        );
        assert_eq!(
            validate_display_name(""),
            Err(ProtocolError::InvalidDisplayName)
        );
    }

    #[test]
    fn oversized_display_names_are_rejected() {
        let name = "x".repeat(25);
        assert_eq!(
            validate_display_name(&name),
            Err(ProtocolError::InvalidDisplayName)
        );
        assert!(validate_display_name(&name[..24]).is_ok());
    }
}
