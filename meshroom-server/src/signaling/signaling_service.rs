use crate::registry::ConnectionRegistry;
use crate::room::RoomDirectory;
use meshroom_core::{ClientId, ClientSignal, IceServerConfig, RoomId, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

struct SignalingInner {
    registry: ConnectionRegistry,
    directory: RoomDirectory,
    ice_servers: Vec<IceServerConfig>,
}

/// The relay: routes envelopes between connected clients.
///
/// It stamps the sender's identity onto everything it forwards and otherwise
/// passes descriptions, candidates and chat text through untouched. Signals for
/// clients that are no longer live are dropped without telling the sender.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                registry: ConnectionRegistry::new(),
                directory: RoomDirectory::new(),
                ice_servers,
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.inner.registry
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.inner.directory
    }

    /// Register a new connection and greet it with its ICE servers and identity.
    pub fn connect(&self, outbound: mpsc::UnboundedSender<ServerSignal>) -> ClientId {
        let client_id = self.inner.registry.register(outbound);

        self.inner.registry.deliver(
            &client_id,
            ServerSignal::IceConfig {
                ice_servers: self.get_ice_servers(),
            },
        );
        self.inner
            .registry
            .deliver(&client_id, ServerSignal::Welcome { client_id });

        info!("Client {} connected", client_id);
        client_id
    }

    /// Route one envelope received from `sender`.
    pub fn handle(&self, sender: ClientId, signal: ClientSignal) {
        match signal {
            ClientSignal::JoinRoom { room_id } => self.join(sender, room_id),

            ClientSignal::LeaveRoom { room_id } => {
                if self.inner.directory.leave(&room_id, sender) {
                    info!("Client {} left room '{}'", sender, room_id);
                    self.announce_departure(sender, &room_id);
                }
            }

            ClientSignal::Offer {
                target,
                negotiation_id,
                sdp,
            } => self.forward(
                target,
                ServerSignal::Offer {
                    caller_id: sender,
                    negotiation_id,
                    sdp,
                },
            ),

            ClientSignal::Answer {
                target,
                negotiation_id,
                sdp,
            } => self.forward(
                target,
                ServerSignal::Answer {
                    caller_id: sender,
                    negotiation_id,
                    sdp,
                },
            ),

            ClientSignal::IceCandidate {
                target,
                negotiation_id,
                candidate,
            } => self.forward(
                target,
                ServerSignal::IceCandidate {
                    sender_id: sender,
                    negotiation_id,
                    candidate,
                },
            ),

            ClientSignal::SendMessage {
                room_id,
                author,
                text,
            } => {
                let recipients = self.inner.directory.members_except(&room_id, sender);
                debug!(
                    "Chat from {} in '{}' fanned out to {} members",
                    sender,
                    room_id,
                    recipients.len()
                );
                for member in recipients {
                    self.forward(
                        member,
                        ServerSignal::ReceiveMessage {
                            room_id: room_id.clone(),
                            sender_id: sender,
                            author: author.clone(),
                            text: text.clone(),
                        },
                    );
                }
            }
        }
    }

    /// Tear down everything a closed connection left behind.
    ///
    /// Safe to call more than once; later calls find nothing to remove.
    pub fn disconnect(&self, client_id: ClientId) {
        if !self.inner.registry.unregister(&client_id) {
            debug!("Client {} was already unregistered", client_id);
        }

        for room_id in self.inner.directory.rooms_of(client_id) {
            if self.inner.directory.leave(&room_id, client_id) {
                self.announce_departure(client_id, &room_id);
            }
        }

        info!("Client {} disconnected", client_id);
    }

    fn join(&self, client_id: ClientId, room_id: RoomId) {
        let outcome = self.inner.directory.join(&room_id, client_id);
        if !outcome.newly_joined {
            debug!("Client {} re-joined room '{}', ignoring", client_id, room_id);
            return;
        }

        info!(
            "Client {} joined room '{}' ({} already present)",
            client_id,
            room_id,
            outcome.prior_members.len()
        );

        // Existing members initiate toward the newcomer; the newcomer is told nothing.
        for member in outcome.prior_members {
            self.forward(
                member,
                ServerSignal::UserJoined {
                    peer_id: client_id,
                    room_id: room_id.clone(),
                },
            );
        }
    }

    fn announce_departure(&self, client_id: ClientId, room_id: &RoomId) {
        for member in self.inner.directory.members_except(room_id, client_id) {
            self.forward(
                member,
                ServerSignal::PeerLeft {
                    peer_id: client_id,
                    room_id: room_id.clone(),
                },
            );
        }
    }

    fn forward(&self, target: ClientId, signal: ServerSignal) {
        if !self.inner.registry.deliver(&target, signal) {
            debug!("Dropping signal for {}: client is not live", target);
        }
    }
}
