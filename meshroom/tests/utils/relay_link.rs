use async_trait::async_trait;
use meshroom_client::{ClientError, SignalingOutput};
use meshroom_core::{ClientId, ClientSignal};
use meshroom_server::SignalingService;

/// Signaling straight into an in-process relay, as one connected client.
pub struct RelayLink {
    pub service: SignalingService,
    pub client_id: ClientId,
}

#[async_trait]
impl SignalingOutput for RelayLink {
    async fn send_signal(&self, signal: ClientSignal) -> Result<(), ClientError> {
        if !self.service.registry().is_live(&self.client_id) {
            return Err(ClientError::SignalingClosed);
        }
        self.service.handle(self.client_id, signal);
        Ok(())
    }
}
