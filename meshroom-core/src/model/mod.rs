mod client;
mod room;
mod session;
mod signaling;

pub use client::ClientId;
pub use room::RoomId;
pub use session::{IceCandidate, NegotiationId, SdpKind, SessionDescription};
pub use signaling::{ClientSignal, IceServerConfig, ServerSignal};
