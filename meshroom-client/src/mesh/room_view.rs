use crate::{LocalStream, NegotiationRole, NegotiationState, RemoteStream};
use meshroom_core::{ClientId, NegotiationId, RoomId};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerStatus {
    pub role: NegotiationRole,
    pub state: NegotiationState,
    pub negotiation_id: NegotiationId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    /// `None` for our own messages sent before the relay greeted us.
    pub sender_id: Option<ClientId>,
    pub author: String,
    pub text: String,
    pub is_local: bool,
}

/// What the UI renders: the room, our own media and everyone else's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomView {
    pub local_id: Option<ClientId>,
    pub room_id: Option<RoomId>,
    pub local_stream: Option<LocalStream>,
    /// Why local capture is missing, if it is.
    pub media_error: Option<String>,
    pub peers: HashMap<ClientId, PeerStatus>,
    pub remote_streams: HashMap<ClientId, RemoteStream>,
    pub chat: Vec<ChatEntry>,
}

impl RoomView {
    pub fn connected_peers(&self) -> usize {
        self.peers
            .values()
            .filter(|status| status.state == NegotiationState::Connected)
            .count()
    }
}
