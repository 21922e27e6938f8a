use super::{MESH_TIMEOUT_MS, RelayLink};
use anyhow::{Context, Result};
use meshroom_client::testing::MockMediaStack;
use meshroom_client::{MeshConfig, MeshCoordinator, MeshHandle, NegotiationState, RoomView};
use meshroom_core::ClientId;
use meshroom_server::SignalingService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// A mesh client wired to an in-process relay with a scripted media stack.
pub struct TestPeer {
    pub client_id: ClientId,
    pub handle: MeshHandle,
    pub media: MockMediaStack,
    service: SignalingService,
}

impl TestPeer {
    pub async fn connect(service: &SignalingService, name: &str) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client_id = service.connect(tx);
        let media = MockMediaStack::new();

        let handle = MeshCoordinator::spawn(
            MeshConfig::default().with_display_name(name),
            Arc::new(media.clone()),
            Arc::new(RelayLink {
                service: service.clone(),
                client_id,
            }),
            rx,
        );

        let peer = Self {
            client_id,
            handle,
            media,
            service: service.clone(),
        };
        peer.wait_for(|view| view.local_id == Some(client_id))
            .await
            .context("Relay never greeted the client")?;
        Ok(peer)
    }

    /// Drop the connection as if the socket had gone away.
    pub fn disconnect(&self) {
        self.service.disconnect(self.client_id);
    }

    pub async fn wait_for(&self, predicate: impl FnMut(&RoomView) -> bool) -> Result<RoomView> {
        let view = tokio::time::timeout(
            Duration::from_millis(MESH_TIMEOUT_MS),
            self.handle.wait_for(predicate),
        )
        .await
        .context("Timeout waiting for room view")??;
        Ok(view)
    }

    /// Wait until exactly `peers` are linked and every link is connected.
    pub async fn wait_connected_to(&self, peers: &[ClientId]) -> Result<RoomView> {
        self.wait_for(|view| {
            view.peers.len() == peers.len()
                && peers.iter().all(|peer| {
                    view.peers.get(peer).map(|status| status.state)
                        == Some(NegotiationState::Connected)
                })
        })
        .await
        .with_context(|| format!("{} never connected to {:?}", self.client_id, peers))
    }
}
