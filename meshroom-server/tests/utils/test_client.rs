use meshroom_core::{ClientId, ClientSignal, RoomId, ServerSignal};
use meshroom_server::SignalingService;
use tokio::sync::mpsc;

use super::signal_helpers::{drain_signals, next_signal};

/// A relay client that talks to `SignalingService` directly, without a socket.
pub struct TestClient {
    pub client_id: ClientId,
    service: SignalingService,
    rx: mpsc::UnboundedReceiver<ServerSignal>,
}

impl TestClient {
    /// Connect and consume the ice-config/welcome handshake.
    pub async fn connect(service: &SignalingService) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client_id = service.connect(tx);

        assert!(matches!(
            next_signal(&mut rx).await,
            ServerSignal::IceConfig { .. }
        ));
        assert_eq!(
            next_signal(&mut rx).await,
            ServerSignal::Welcome { client_id }
        );

        Self {
            client_id,
            service: service.clone(),
            rx,
        }
    }

    pub fn send(&self, signal: ClientSignal) {
        self.service.handle(self.client_id, signal);
    }

    pub fn join(&self, room: &str) {
        self.send(ClientSignal::JoinRoom {
            room_id: RoomId::from(room),
        });
    }

    pub fn leave(&self, room: &str) {
        self.send(ClientSignal::LeaveRoom {
            room_id: RoomId::from(room),
        });
    }

    pub fn chat(&self, room: &str, text: &str) {
        self.send(ClientSignal::SendMessage {
            room_id: RoomId::from(room),
            author: "tester".to_string(),
            text: text.to_string(),
        });
    }

    pub fn disconnect(&self) {
        self.service.disconnect(self.client_id);
    }

    pub async fn next(&mut self) -> ServerSignal {
        next_signal(&mut self.rx).await
    }

    pub async fn drain(&mut self) -> Vec<ServerSignal> {
        drain_signals(&mut self.rx).await
    }
}
