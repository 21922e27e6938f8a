use crate::ClientError;
use async_trait::async_trait;
use meshroom_core::ClientSignal;

/// Outbound half of the signaling channel.
///
/// Delivery is fire-and-forget: `Ok` means the envelope was handed to the
/// channel, not that the relay or the target received it.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(&self, signal: ClientSignal) -> Result<(), ClientError>;
}
