use crate::media::{
    LocalStream, MediaConnectionState, MediaEvent, MediaEventSink, MediaSession, MediaStack,
    RemoteTrack, TrackKind,
};
use crate::MediaError;
use async_trait::async_trait;
use meshroom_core::{ClientId, IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Mute switches shared with whatever feeds samples into the local tracks.
#[derive(Debug)]
pub struct TrackSwitches {
    audio: AtomicBool,
    video: AtomicBool,
}

impl Default for TrackSwitches {
    fn default() -> Self {
        Self {
            audio: AtomicBool::new(true),
            video: AtomicBool::new(true),
        }
    }
}

impl TrackSwitches {
    pub fn is_enabled(&self, kind: TrackKind) -> bool {
        self.switch(kind).load(Ordering::Relaxed)
    }

    fn set(&self, kind: TrackKind, enabled: bool) {
        self.switch(kind).store(enabled, Ordering::Relaxed);
    }

    fn switch(&self, kind: TrackKind) -> &AtomicBool {
        match kind {
            TrackKind::Audio => &self.audio,
            TrackKind::Video => &self.video,
        }
    }
}

/// [`MediaStack`] backed by webrtc-rs.
///
/// Local tracks are sample tracks written by the application; a muted kind
/// keeps its track and sender, the producer just stops writing (see
/// [`TrackSwitches`]). Kinds without a local track are negotiated receive-only.
pub struct WebRtcMediaStack {
    stream_id: String,
    tracks: Vec<Arc<TrackLocalStaticSample>>,
    switches: Arc<TrackSwitches>,
}

impl WebRtcMediaStack {
    /// No local capture; every session only receives.
    pub fn receive_only() -> Self {
        Self::with_tracks(uuid::Uuid::new_v4().to_string(), Vec::new())
    }

    pub fn with_tracks(
        stream_id: impl Into<String>,
        tracks: Vec<Arc<TrackLocalStaticSample>>,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            tracks,
            switches: Arc::new(TrackSwitches::default()),
        }
    }

    /// Opus audio or VP8 video sample track in `stream_id`.
    pub fn new_track(kind: TrackKind, stream_id: &str) -> Arc<TrackLocalStaticSample> {
        let (mime_type, label) = match kind {
            TrackKind::Audio => (MIME_TYPE_OPUS, "audio"),
            TrackKind::Video => (MIME_TYPE_VP8, "video"),
        };
        Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            format!("{}-{}", stream_id, label),
            stream_id.to_owned(),
        ))
    }

    pub fn switches(&self) -> Arc<TrackSwitches> {
        self.switches.clone()
    }

    fn has_track(&self, kind: TrackKind) -> bool {
        self.tracks
            .iter()
            .any(|track| track_kind(track.kind()) == Some(kind))
    }
}

#[async_trait]
impl MediaStack for WebRtcMediaStack {
    async fn local_stream(&self) -> Result<LocalStream, MediaError> {
        if self.tracks.is_empty() {
            return Err(MediaError::Acquisition(
                "no local capture configured".to_owned(),
            ));
        }

        Ok(LocalStream {
            stream_id: self.stream_id.clone(),
            audio_enabled: self.has_track(TrackKind::Audio)
                && self.switches.is_enabled(TrackKind::Audio),
            video_enabled: self.has_track(TrackKind::Video)
                && self.switches.is_enabled(TrackKind::Video),
        })
    }

    async fn open_session(
        &self,
        peer_id: ClientId,
        ice_servers: &[IceServerConfig],
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, MediaError> {
        debug!("Opening session toward {}", peer_id);
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        for track in &self.tracks {
            let sender = peer_connection
                .add_track(Arc::clone(track) as Arc<dyn TrackLocal + Send + Sync>)
                .await?;
            // RTCP has to be read for the interceptors to work.
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });
        }
        for kind in [TrackKind::Audio, TrackKind::Video] {
            if !self.has_track(kind) {
                peer_connection
                    .add_transceiver_from_kind(
                        codec_type(kind),
                        Some(RTCRtpTransceiverInit {
                            direction: RTCRtpTransceiverDirection::Recvonly,
                            send_encodings: Vec::new(),
                        }),
                    )
                    .await?;
            }
        }

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();

                Box::pin(async move {
                    info!(
                        "Peer connection state changed for {}: {:?}",
                        events.peer_id(),
                        s
                    );
                    events.emit(MediaEvent::ConnectionStateChanged(connection_state(s)));
                })
            },
        ));

        let candidate_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = candidate_events.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events.emit(MediaEvent::CandidateGathered(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                }));
            })
        }));

        let track_events = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();

                Box::pin(async move {
                    let Some(kind) = track_kind(track.kind()) else {
                        return;
                    };
                    debug!("Remote {:?} track from {}", kind, events.peer_id());
                    events.emit(MediaEvent::TrackAdded {
                        stream_id: track.stream_id(),
                        track: RemoteTrack {
                            track_id: track.id(),
                            kind,
                        },
                    });
                })
            },
        ));

        Ok(Arc::new(WebRtcSession { peer_connection }))
    }

    async fn set_track_enabled(&self, kind: TrackKind, enabled: bool) {
        self.switches.set(kind, enabled);
    }
}

struct WebRtcSession {
    peer_connection: Arc<RTCPeerConnection>,
}

#[async_trait]
impl MediaSession for WebRtcSession {
    async fn create_offer(&self) -> Result<SessionDescription, MediaError> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, MediaError> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError> {
        self.peer_connection
            .set_local_description(to_rtc_description(description)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError> {
        self.peer_connection
            .set_remote_description(to_rtc_description(description)?)
            .await
            .map_err(|e| MediaError::InvalidDescription(e.to_string()))
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        self.peer_connection
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_m_line_index,
                username_fragment: candidate.username_fragment,
            })
            .await
            .map_err(|e| MediaError::InvalidCandidate(e.to_string()))
    }

    async fn close(&self) -> Result<(), MediaError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc_description(description: SessionDescription) -> Result<RTCSessionDescription, MediaError> {
    let parsed = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp),
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp),
    };
    parsed.map_err(|e| MediaError::InvalidDescription(e.to_string()))
}

fn connection_state(state: RTCPeerConnectionState) -> MediaConnectionState {
    match state {
        RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => {
            MediaConnectionState::New
        }
        RTCPeerConnectionState::Connecting => MediaConnectionState::Connecting,
        RTCPeerConnectionState::Connected => MediaConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => MediaConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => MediaConnectionState::Failed,
        RTCPeerConnectionState::Closed => MediaConnectionState::Closed,
    }
}

fn codec_type(kind: TrackKind) -> RTPCodecType {
    match kind {
        TrackKind::Audio => RTPCodecType::Audio,
        TrackKind::Video => RTPCodecType::Video,
    }
}

fn track_kind(codec_type: RTPCodecType) -> Option<TrackKind> {
    match codec_type {
        RTPCodecType::Audio => Some(TrackKind::Audio),
        RTPCodecType::Video => Some(TrackKind::Video),
        RTPCodecType::Unspecified => None,
    }
}
