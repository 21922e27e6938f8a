use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use meshroom_core::{ClientId, ServerSignal};
use tokio::sync::mpsc;
use tracing::debug;

/// Live connections and the queue feeding each one's socket writer.
///
/// A connection is live from [`register`](Self::register) until
/// [`unregister`](Self::unregister). Removing a connection here does not touch
/// room membership; the relay runs that cascade right after.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ClientId, mpsc::UnboundedSender<ServerSignal>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a fresh identity to a new connection.
    pub fn register(&self, outbound: mpsc::UnboundedSender<ServerSignal>) -> ClientId {
        loop {
            let client_id = ClientId::new();
            if let Entry::Vacant(slot) = self.connections.entry(client_id) {
                slot.insert(outbound);
                debug!("Registered connection {}", client_id);
                return client_id;
            }
        }
    }

    /// Forget a connection. Returns `false` if it was already gone.
    pub fn unregister(&self, client_id: &ClientId) -> bool {
        self.connections.remove(client_id).is_some()
    }

    pub fn is_live(&self, client_id: &ClientId) -> bool {
        self.connections.contains_key(client_id)
    }

    /// Queue a signal for a client without waiting on its socket.
    ///
    /// Returns `false` when the client is not live or its writer has already
    /// shut down; the signal is dropped in that case.
    pub fn deliver(&self, client_id: &ClientId, signal: ServerSignal) -> bool {
        match self.connections.get(client_id) {
            Some(outbound) => outbound.send(signal).is_ok(),
            None => false,
        }
    }

    pub fn live_count(&self) -> usize {
        self.connections.len()
    }
}
