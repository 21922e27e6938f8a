use crate::model::client::ClientId;
use crate::model::room::RoomId;
use crate::model::session::{IceCandidate, NegotiationId, SessionDescription};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Envelopes a client sends to the relay.
///
/// None of them carry the sender's identity: the relay stamps it from the
/// connection the envelope arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientSignal {
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    Offer {
        target: ClientId,
        negotiation_id: NegotiationId,
        sdp: SessionDescription,
    },
    Answer {
        target: ClientId,
        negotiation_id: NegotiationId,
        sdp: SessionDescription,
    },
    IceCandidate {
        target: ClientId,
        negotiation_id: NegotiationId,
        candidate: IceCandidate,
    },
    SendMessage {
        room_id: RoomId,
        author: String,
        text: String,
    },
}

/// Envelopes the relay delivers to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerSignal {
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    Welcome {
        client_id: ClientId,
    },
    UserJoined {
        peer_id: ClientId,
        room_id: RoomId,
    },
    PeerLeft {
        peer_id: ClientId,
        room_id: RoomId,
    },
    Offer {
        caller_id: ClientId,
        negotiation_id: NegotiationId,
        sdp: SessionDescription,
    },
    Answer {
        caller_id: ClientId,
        negotiation_id: NegotiationId,
        sdp: SessionDescription,
    },
    IceCandidate {
        sender_id: ClientId,
        negotiation_id: NegotiationId,
        candidate: IceCandidate,
    },
    ReceiveMessage {
        room_id: RoomId,
        sender_id: ClientId,
        author: String,
        text: String,
    },
}
