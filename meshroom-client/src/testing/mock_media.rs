use crate::{
    LocalStream, MediaConnectionState, MediaError, MediaEvent, MediaEventSink, MediaSession,
    MediaStack, RemoteTrack, TrackKind,
};
use async_trait::async_trait;
use meshroom_core::{ClientId, IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const MOCK_LOCAL_STREAM_ID: &str = "mock-local";

/// Scripted media stack.
///
/// Sessions accept any description whose SDP starts with `v=0`, gather a fixed
/// number of candidates whenever a local description is applied, and report
/// `Connected` plus one remote audio track once both descriptions are in place.
#[derive(Clone)]
pub struct MockMediaStack {
    local_media_error: Option<String>,
    latency: Duration,
    gathered_candidates: usize,
    sessions: Arc<Mutex<Vec<Arc<MockMediaSession>>>>,
    toggles: Arc<Mutex<Vec<(TrackKind, bool)>>>,
}

impl Default for MockMediaStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaStack {
    pub fn new() -> Self {
        Self {
            local_media_error: None,
            latency: Duration::ZERO,
            gathered_candidates: 1,
            sessions: Arc::new(Mutex::new(Vec::new())),
            toggles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Local capture fails with `reason`.
    pub fn without_local_media(mut self, reason: impl Into<String>) -> Self {
        self.local_media_error = Some(reason.into());
        self
    }

    /// Delay every description operation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_gathered_candidates(mut self, count: usize) -> Self {
        self.gathered_candidates = count;
        self
    }

    /// Every session opened so far, oldest first.
    pub async fn sessions(&self) -> Vec<Arc<MockMediaSession>> {
        self.sessions.lock().await.clone()
    }

    /// The most recent session toward `peer_id`.
    pub async fn session_for(&self, peer_id: ClientId) -> Option<Arc<MockMediaSession>> {
        self.sessions
            .lock()
            .await
            .iter()
            .rev()
            .find(|session| session.peer_id() == peer_id)
            .cloned()
    }

    pub async fn toggles(&self) -> Vec<(TrackKind, bool)> {
        self.toggles.lock().await.clone()
    }
}

#[async_trait]
impl MediaStack for MockMediaStack {
    async fn local_stream(&self) -> Result<LocalStream, MediaError> {
        match &self.local_media_error {
            Some(reason) => Err(MediaError::Acquisition(reason.clone())),
            None => Ok(LocalStream {
                stream_id: MOCK_LOCAL_STREAM_ID.to_owned(),
                audio_enabled: true,
                video_enabled: true,
            }),
        }
    }

    async fn open_session(
        &self,
        peer_id: ClientId,
        _ice_servers: &[IceServerConfig],
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, MediaError> {
        let session = Arc::new(MockMediaSession {
            peer_id,
            events,
            latency: self.latency,
            gathered_candidates: self.gathered_candidates,
            state: Mutex::new(MockSessionState::default()),
        });
        self.sessions.lock().await.push(session.clone());
        Ok(session)
    }

    async fn set_track_enabled(&self, kind: TrackKind, enabled: bool) {
        self.toggles.lock().await.push((kind, enabled));
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockSessionState {
    pub local_description: Option<SessionDescription>,
    pub remote_description: Option<SessionDescription>,
    pub added_candidates: Vec<IceCandidate>,
    pub closed: bool,
    gathered: usize,
}

pub struct MockMediaSession {
    peer_id: ClientId,
    events: MediaEventSink,
    latency: Duration,
    gathered_candidates: usize,
    state: Mutex<MockSessionState>,
}

impl MockMediaSession {
    pub fn peer_id(&self) -> ClientId {
        self.peer_id
    }

    pub async fn state(&self) -> MockSessionState {
        self.state.lock().await.clone()
    }

    /// Inject an event as if the media stack had raised it.
    pub fn emit(&self, event: MediaEvent) -> bool {
        self.events.emit(event)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn announce_connected(&self) {
        self.events.emit(MediaEvent::ConnectionStateChanged(
            MediaConnectionState::Connected,
        ));
        self.events.emit(MediaEvent::TrackAdded {
            stream_id: format!("stream-{}", self.peer_id),
            track: RemoteTrack {
                track_id: format!("audio-{}", self.peer_id),
                kind: TrackKind::Audio,
            },
        });
    }
}

fn validate(description: &SessionDescription) -> Result<(), MediaError> {
    if description.sdp.starts_with("v=0") {
        Ok(())
    } else {
        Err(MediaError::InvalidDescription(format!(
            "unparseable SDP: {:?}",
            description.sdp
        )))
    }
}

#[async_trait]
impl MediaSession for MockMediaSession {
    async fn create_offer(&self) -> Result<SessionDescription, MediaError> {
        self.delay().await;
        if self.state.lock().await.closed {
            return Err(MediaError::SessionClosed);
        }
        Ok(SessionDescription::offer(format!(
            "v=0\r\no=mock offer toward {}\r\n",
            self.peer_id
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription, MediaError> {
        self.delay().await;
        let state = self.state.lock().await;
        if state.closed {
            return Err(MediaError::SessionClosed);
        }
        match &state.remote_description {
            Some(remote) if remote.kind == SdpKind::Offer => Ok(SessionDescription::answer(
                format!("v=0\r\no=mock answer toward {}\r\n", self.peer_id),
            )),
            _ => Err(MediaError::InvalidDescription(
                "no remote offer to answer".to_owned(),
            )),
        }
    }

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError> {
        validate(&description)?;
        let (candidates, complete) = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(MediaError::SessionClosed);
            }
            state.local_description = Some(description);

            let first = state.gathered;
            state.gathered += self.gathered_candidates;
            let candidates: Vec<_> = (first..state.gathered)
                .map(|n| {
                    IceCandidate::new(format!(
                        "candidate:{} 1 udp 2122260223 192.0.2.{} {} typ host",
                        n,
                        n % 250 + 1,
                        50000 + n
                    ))
                })
                .collect();
            (candidates, state.remote_description.is_some())
        };

        for candidate in candidates {
            self.events.emit(MediaEvent::CandidateGathered(candidate));
        }
        if complete {
            self.announce_connected();
        }
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError> {
        self.delay().await;
        validate(&description)?;
        let complete = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(MediaError::SessionClosed);
            }
            state.remote_description = Some(description);
            state.local_description.is_some()
        };

        if complete {
            self.announce_connected();
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        let mut state = self.state.lock().await;
        if state.remote_description.is_none() {
            return Err(MediaError::InvalidCandidate(
                "remote description not set".to_owned(),
            ));
        }
        state.added_candidates.push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<(), MediaError> {
        self.state.lock().await.closed = true;
        Ok(())
    }
}
