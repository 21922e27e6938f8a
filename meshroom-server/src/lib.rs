//! Signaling relay for full-mesh rooms.
//!
//! The relay knows who is connected ([`ConnectionRegistry`]) and who is in
//! which room ([`RoomDirectory`]); [`SignalingService`] routes envelopes
//! between them without interpreting descriptions or candidates.

pub mod app;
pub mod config;
mod registry;
mod room;
mod signaling;

pub use app::*;
pub use registry::*;
pub use room::*;
pub use signaling::*;
