use crate::{ClientError, SignalingOutput};
use async_trait::async_trait;
use meshroom_core::{ClientId, ClientSignal};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc};

/// SignalingOutput that captures every outgoing envelope.
#[derive(Clone)]
pub struct MockSignalingOutput {
    /// Channel to send captured signals.
    tx: mpsc::UnboundedSender<ClientSignal>,
    /// All captured signals (for verification).
    signals: Arc<Mutex<Vec<ClientSignal>>>,
    closed: Arc<AtomicBool>,
}

impl MockSignalingOutput {
    /// Create a new MockSignalingOutput and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClientSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        };
        (signaling, rx)
    }

    /// Create a MockSignalingOutput without a receiver (signals are only stored).
    pub fn new_stored_only() -> Self {
        let (signaling, _rx) = Self::new();
        signaling
    }

    /// Make every later send fail as if the socket had closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub async fn signals(&self) -> Vec<ClientSignal> {
        self.signals.lock().await.clone()
    }

    /// Everything addressed to `peer_id` (offers, answers, candidates).
    pub async fn signals_for(&self, peer_id: ClientId) -> Vec<ClientSignal> {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|signal| match signal {
                ClientSignal::Offer { target, .. }
                | ClientSignal::Answer { target, .. }
                | ClientSignal::IceCandidate { target, .. } => *target == peer_id,
                _ => false,
            })
            .cloned()
            .collect()
    }
}

impl Default for MockSignalingOutput {
    fn default() -> Self {
        Self::new_stored_only()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_signal(&self, signal: ClientSignal) -> Result<(), ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::SignalingClosed);
        }
        tracing::debug!("[MockSignaling] {:?}", signal);

        self.signals.lock().await.push(signal.clone());
        let _ = self.tx.send(signal);
        Ok(())
    }
}
