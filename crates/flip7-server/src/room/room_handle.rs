use flip7_lib::{net::Message, PlayerId};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::RoomError;
use super::{room_actor::RoomAction, RoomResult};

/// Mints [`RoomHandle`]s for players joining an already-running room. Holds
/// only a weak sender so that outstanding providers in the registry can't
/// keep a dead room alive.
#[derive(Clone, Debug)]
pub struct RoomHandleProvider {
    pub(super) sender: mpsc::WeakSender<RoomAction>,
}

impl RoomHandleProvider {
    pub fn into_handle(self, player_id: impl Into<PlayerId>) -> RoomResult<RoomHandle> {
        Ok(RoomHandle {
            sender: self.sender.upgrade().ok_or(RoomError::HandleInvalid)?,
            player_id: player_id.into(),
        })
    }
}

#[derive(Debug)]
pub struct RoomHandle {
    pub(super) sender: mpsc::Sender<RoomAction>,
    pub(super) player_id: PlayerId,
}

impl RoomHandle {
    async fn execute<T>(
        &self,
        msg: RoomAction,
        rx: oneshot::Receiver<Result<T, RoomError>>,
    ) -> Result<T, RoomError> {
        // Ignore first error, if there is an error, rx.await will fail as well since it's sender
        // will have been dropped
        let _ = self.sender.send(msg).await;
        rx.await.unwrap_or(Err(RoomError::HandleInvalid))
    }

    /// Seats this handle's player in the room. The returned receiver carries
    /// every event broadcast to the room from this point on.
    pub async fn join_room(
        &self,
        display_name: String,
    ) -> Result<broadcast::Receiver<Message>, RoomError> {
        let (tx, rx) = oneshot::channel();
        let msg = RoomAction::AddPlayer {
            respond_to: tx,
            id: self.player_id,
            display_name,
        };
        self.execute(msg, rx).await
    }

    pub async fn set_ready(&self) -> Result<(), RoomError> {
        let (tx, rx) = oneshot::channel();
        let msg = RoomAction::SetReady {
            respond_to: tx,
            id: self.player_id,
        };
        self.execute(msg, rx).await
    }

    pub async fn flip_card(&self) -> Result<(), RoomError> {
        let (tx, rx) = oneshot::channel();
        let msg = RoomAction::FlipCard {
            respond_to: tx,
            id: self.player_id,
        };
        self.execute(msg, rx).await
    }

    pub async fn bank_points(&self) -> Result<(), RoomError> {
        let (tx, rx) = oneshot::channel();
        let msg = RoomAction::BankPoints {
            respond_to: tx,
            id: self.player_id,
        };
        self.execute(msg, rx).await
    }

    pub async fn end_turn(&self) -> Result<(), RoomError> {
        let (tx, rx) = oneshot::channel();
        let msg = RoomAction::EndTurn {
            respond_to: tx,
            id: self.player_id,
        };
        self.execute(msg, rx).await
    }
}

impl Drop for RoomHandle {
    fn drop(&mut self) {
        let tx = self.sender.clone();
        let id = self.player_id;
        tokio::spawn(async move {
            if let Err(e) = tx.send(RoomAction::RemovePlayer { id }).await {
                tracing::warn!(%e, "Failed to remove player from their room.");
            }
        });
    }
}

#[cfg(test)]
mod test {
    use flip7_lib::PlayerId;
    use tokio::sync::mpsc;

    use crate::room::{room_actor::RoomAction, RoomError};

    use super::{RoomHandle, RoomHandleProvider};

    fn setup() -> (mpsc::Receiver<RoomAction>, RoomHandle) {
        let (tx, rx) = mpsc::channel(2);
        let handle = RoomHandle {
            sender: tx,
            player_id: 123.into(),
        };
        (rx, handle)
    }

    #[tokio::test]
    async fn provider_provides_new_handle() {
        let (tx, _rx) = mpsc::channel(2);
        let handle_provider = RoomHandleProvider {
            sender: tx.downgrade(),
        };

        let handle = handle_provider.into_handle(123).unwrap();
        assert_eq!(handle.player_id, 123);
    }

    #[tokio::test]
    async fn add_player() {
        let (mut rx, handle) = setup();
        let actor = tokio::spawn(async move {
            let m = rx.recv().await.unwrap();
            let RoomAction::AddPlayer {
                respond_to: _,
                id,
                display_name,
            } = m
            else {
                panic!("Incorrect RoomAction produced");
            };
            assert_eq!(id, 123);
            assert_eq!(display_name, "tester");
        });
        let _ = handle.join_room("tester".to_owned()).await;
        actor.await.unwrap();
    }

    #[tokio::test]
    async fn set_ready() {
        let (mut rx, handle) = setup();
        let actor = tokio::spawn(async move {
            let m = rx.recv().await.unwrap();
            assert!(matches!(
                m,
                RoomAction::SetReady {
                    respond_to: _,
                    id: PlayerId(123),
                }
            ));
        });
        let _ = handle.set_ready().await;
        actor.await.unwrap();
    }

    #[tokio::test]
    async fn flip_card() {
        let (mut rx, handle) = setup();
        let actor = tokio::spawn(async move {
            let m = rx.recv().await.unwrap();
            assert!(matches!(
                m,
                RoomAction::FlipCard {
                    respond_to: _,
                    id: PlayerId(123),
                }
            ));
        });
        let _ = handle.flip_card().await;
        actor.await.unwrap();
    }

    #[tokio::test]
    async fn bank_points() {
        let (mut rx, handle) = setup();
        let actor = tokio::spawn(async move {
            let m = rx.recv().await.unwrap();
            assert!(matches!(
                m,
                RoomAction::BankPoints {
                    respond_to: _,
                    id: PlayerId(123),
                }
            ));
        });
        let _ = handle.bank_points().await;
        actor.await.unwrap();
    }

    #[tokio::test]
    async fn rem_player_on_drop() {
        let (mut rx, handle) = setup();
        let actor = tokio::spawn(async move {
            let m = rx.recv().await.unwrap();
            assert!(matches!(m, RoomAction::RemovePlayer { id: PlayerId(123) }));
        });
        drop(handle);
        actor.await.unwrap();
    }

    #[tokio::test]
    async fn invalid_handle() {
        let (mut rx, handle) = setup();

        // Ensure that an action performed on a closed room will result in a `HandleInvalid` error.
        rx.close();
        assert_eq!(handle.set_ready().await, Err(RoomError::HandleInvalid));
        drop(rx);
        assert_eq!(handle.set_ready().await, Err(RoomError::HandleInvalid));
    }
}
