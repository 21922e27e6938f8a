//! Boundary to the media stack.
//!
//! The coordinator never touches a peer connection directly. It opens one
//! [`MediaSession`] per remote peer through a [`MediaStack`] and learns about
//! gathered candidates, remote tracks and connection state through the
//! [`MediaEventSink`] handed to the session.

mod webrtc_stack;

pub use webrtc_stack::*;

use crate::MediaError;
use crate::mesh::LinkEvent;
use async_trait::async_trait;
use meshroom_core::{ClientId, IceCandidate, IceServerConfig, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Local capture attached to every link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStream {
    pub stream_id: String,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

impl LocalStream {
    pub fn set_enabled(&mut self, kind: TrackKind, enabled: bool) {
        match kind {
            TrackKind::Audio => self.audio_enabled = enabled,
            TrackKind::Video => self.video_enabled = enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub track_id: String,
    pub kind: TrackKind,
}

/// Media received from one remote peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub stream_id: String,
    pub tracks: Vec<RemoteTrack>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    TrackAdded {
        stream_id: String,
        track: RemoteTrack,
    },
    CandidateGathered(IceCandidate),
    ConnectionStateChanged(MediaConnectionState),
}

/// Where a session reports its events. Tagged with the link it belongs to,
/// so events from a session that has since been replaced are discarded.
#[derive(Debug, Clone)]
pub struct MediaEventSink {
    peer_id: ClientId,
    epoch: u64,
    events: mpsc::UnboundedSender<LinkEvent>,
}

impl MediaEventSink {
    pub(crate) fn new(
        peer_id: ClientId,
        epoch: u64,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Self {
        Self {
            peer_id,
            epoch,
            events,
        }
    }

    pub fn peer_id(&self) -> ClientId {
        self.peer_id
    }

    /// Returns false once the coordinator is gone.
    pub fn emit(&self, event: MediaEvent) -> bool {
        self.events
            .send(LinkEvent::media(self.peer_id, self.epoch, event))
            .is_ok()
    }
}

#[async_trait]
pub trait MediaStack: Send + Sync {
    /// Acquire local capture. On error the room is joined without local media.
    async fn local_stream(&self) -> Result<LocalStream, MediaError>;

    /// Open a session toward `peer_id` with the local tracks attached.
    async fn open_session(
        &self,
        peer_id: ClientId,
        ice_servers: &[IceServerConfig],
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, MediaError>;

    /// Mute or unmute a local track on every session. Never renegotiates.
    async fn set_track_enabled(&self, kind: TrackKind, enabled: bool);
}

/// One media connection to one remote peer.
#[async_trait]
pub trait MediaSession: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, MediaError>;

    async fn create_answer(&self) -> Result<SessionDescription, MediaError>;

    async fn set_local_description(&self, description: SessionDescription)
    -> Result<(), MediaError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError>;

    async fn close(&self) -> Result<(), MediaError>;
}
