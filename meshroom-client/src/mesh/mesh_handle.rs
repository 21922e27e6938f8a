use crate::mesh::mesh_command::{MeshCommand, Reply};
use crate::{
    ClientError, MediaStack, MeshConfig, MeshCoordinator, RoomView, TrackKind, connect_signaling,
};
use meshroom_core::RoomId;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Application-facing side of a [`MeshCoordinator`].
///
/// Cheap to clone. The coordinator leaves the room and stops once every
/// handle is dropped.
#[derive(Clone)]
pub struct MeshHandle {
    command_tx: mpsc::Sender<MeshCommand>,
    view_rx: watch::Receiver<RoomView>,
}

impl MeshHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<MeshCommand>,
        view_rx: watch::Receiver<RoomView>,
    ) -> Self {
        Self {
            command_tx,
            view_rx,
        }
    }

    /// Connect to the relay at `url` and start a coordinator on it.
    pub async fn connect(
        url: &str,
        config: MeshConfig,
        media: Arc<dyn MediaStack>,
    ) -> Result<Self, ClientError> {
        let (signaling, signals) = connect_signaling(url).await?;
        Ok(MeshCoordinator::spawn(
            config,
            media,
            Arc::new(signaling),
            signals,
        ))
    }

    /// Join `room_id`, leaving the current room first if it differs.
    pub async fn join_room(&self, room_id: impl Into<RoomId>) -> Result<(), ClientError> {
        let room_id = room_id.into();
        self.request(|reply| MeshCommand::JoinRoom { room_id, reply })
            .await
    }

    pub async fn leave_room(&self) -> Result<(), ClientError> {
        self.request(|reply| MeshCommand::LeaveRoom { reply }).await
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<(), ClientError> {
        let text = text.into();
        self.request(|reply| MeshCommand::SendChat { text, reply })
            .await
    }

    pub async fn set_microphone(&self, enabled: bool) -> Result<(), ClientError> {
        self.set_track_enabled(TrackKind::Audio, enabled).await
    }

    pub async fn set_camera(&self, enabled: bool) -> Result<(), ClientError> {
        self.set_track_enabled(TrackKind::Video, enabled).await
    }

    /// Snapshot of the room as it is now.
    pub fn view(&self) -> RoomView {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RoomView> {
        self.view_rx.clone()
    }

    /// Wait until the view satisfies `predicate` and return it.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&RoomView) -> bool,
    ) -> Result<RoomView, ClientError> {
        let mut view_rx = self.view_rx.clone();
        let view = view_rx
            .wait_for(predicate)
            .await
            .map_err(|_| ClientError::CoordinatorStopped)?;
        Ok(view.clone())
    }

    async fn set_track_enabled(&self, kind: TrackKind, enabled: bool) -> Result<(), ClientError> {
        self.request(|reply| MeshCommand::SetTrackEnabled {
            kind,
            enabled,
            reply,
        })
        .await
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> MeshCommand,
    ) -> Result<(), ClientError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| ClientError::CoordinatorStopped)?;
        reply_rx.await.map_err(|_| ClientError::CoordinatorStopped)?
    }
}
