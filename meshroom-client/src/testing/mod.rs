//! Test doubles for the media stack and the signaling channel.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for downstream crates.

mod mock_media;
mod mock_signaling;

pub use mock_media::*;
pub use mock_signaling::*;
