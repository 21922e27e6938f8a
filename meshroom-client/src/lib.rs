//! Client side of a full-mesh room.
//!
//! A [`MeshCoordinator`] runs per joined room and keeps one [`PeerLink`]
//! negotiation state machine per remote member. Media is reached through the
//! [`MediaStack`] / [`MediaSession`] traits; signaling goes out through
//! [`SignalingOutput`] and comes back as [`ServerSignal`](meshroom_core::ServerSignal)s.
//! Applications drive a room through [`MeshHandle`].

mod config;
mod error;
pub mod media;
pub mod mesh;
pub mod negotiation;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{DEFAULT_DISPLAY_NAME, MeshConfig};
pub use error::{ClientError, MediaError};
pub use media::{
    LocalStream, MediaConnectionState, MediaEvent, MediaEventSink, MediaSession, MediaStack,
    RemoteStream, RemoteTrack, TrackKind, WebRtcMediaStack,
};
pub use mesh::{ChatEntry, MeshCoordinator, MeshHandle, PeerStatus, RoomView};
pub use negotiation::{
    CloseReason, LinkAction, LinkInput, MediaOp, NegotiationRole, NegotiationState, PeerLink,
};
pub use transport::{SignalingOutput, WsSignaling, connect_signaling};
