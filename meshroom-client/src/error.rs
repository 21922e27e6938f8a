use thiserror::Error;

/// Failures reported by the media stack.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Camera/microphone could not be acquired.
    #[error("local media unavailable: {0}")]
    Acquisition(String),

    #[error("invalid session description: {0}")]
    InvalidDescription(String),

    #[error("invalid ICE candidate: {0}")]
    InvalidCandidate(String),

    #[error("media session is closed")]
    SessionClosed,

    #[error(transparent)]
    WebRtc(#[from] webrtc::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("signaling connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("signaling connection is closed")]
    SignalingClosed,

    #[error("mesh coordinator has stopped")]
    CoordinatorStopped,

    #[error("not in a room")]
    NotInRoom,

    #[error(transparent)]
    Media(#[from] MediaError),
}
