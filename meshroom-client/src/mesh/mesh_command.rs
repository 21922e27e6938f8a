use crate::{ClientError, TrackKind};
use meshroom_core::RoomId;
use tokio::sync::oneshot;

pub(crate) type Reply = oneshot::Sender<Result<(), ClientError>>;

pub(crate) enum MeshCommand {
    JoinRoom { room_id: RoomId, reply: Reply },
    LeaveRoom { reply: Reply },
    SendChat { text: String, reply: Reply },
    SetTrackEnabled { kind: TrackKind, enabled: bool, reply: Reply },
}
