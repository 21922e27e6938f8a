use crate::mesh::link_worker::run_link_worker;
use crate::mesh::mesh_command::MeshCommand;
use crate::mesh::{LinkEvent, LinkEventKind};
use crate::{
    ChatEntry, ClientError, CloseReason, LinkAction, LinkInput, MediaEvent, MediaEventSink,
    MediaOp, MediaSession, MediaStack, MeshConfig, MeshHandle, NegotiationRole, PeerLink,
    PeerStatus, RemoteStream, RoomView, SignalingOutput,
};
use meshroom_core::{
    ClientId, ClientSignal, IceCandidate, IceServerConfig, NegotiationId, RoomId, ServerSignal,
};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Candidates held per sender while its link does not exist yet.
const MAX_ORPHAN_CANDIDATES: usize = 64;

/// Senders that may have candidates held at once.
pub(crate) const MAX_ORPHAN_SENDERS: usize = 32;

struct LinkEntry {
    link: PeerLink,
    epoch: u64,
    session: Arc<dyn MediaSession>,
    ops_tx: mpsc::UnboundedSender<MediaOp>,
    worker: JoinHandle<()>,
    timer: Option<JoinHandle<()>>,
}

/// Owns every link of the local client and applies all inputs to them one
/// at a time: application commands, relay signals and media events.
///
/// Media operations run on a per-link worker so a slow session never stalls
/// the others; their completions come back here as events.
pub struct MeshCoordinator {
    config: MeshConfig,
    media: Arc<dyn MediaStack>,
    signaling: Arc<dyn SignalingOutput>,
    local_id: Option<ClientId>,
    room_id: Option<RoomId>,
    ice_servers: Vec<IceServerConfig>,
    links: HashMap<ClientId, LinkEntry>,
    orphan_candidates: HashMap<ClientId, Vec<(NegotiationId, IceCandidate)>>,
    next_epoch: u64,
    command_rx: mpsc::Receiver<MeshCommand>,
    signal_rx: mpsc::UnboundedReceiver<ServerSignal>,
    event_rx: mpsc::UnboundedReceiver<LinkEvent>,
    event_tx: mpsc::UnboundedSender<LinkEvent>,
    view_tx: watch::Sender<RoomView>,
}

impl MeshCoordinator {
    /// Start a coordinator on an established signaling channel.
    ///
    /// `signals` carries everything the relay sends to this client; when it
    /// ends, the coordinator releases its links and stops.
    pub fn spawn(
        config: MeshConfig,
        media: Arc<dyn MediaStack>,
        signaling: Arc<dyn SignalingOutput>,
        signals: mpsc::UnboundedReceiver<ServerSignal>,
    ) -> MeshHandle {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(RoomView::default());

        let coordinator = Self {
            config,
            media,
            signaling,
            local_id: None,
            room_id: None,
            ice_servers: Vec::new(),
            links: HashMap::new(),
            orphan_candidates: HashMap::new(),
            next_epoch: 0,
            command_rx,
            signal_rx: signals,
            event_rx,
            event_tx,
            view_tx,
        };
        tokio::spawn(coordinator.run());

        MeshHandle::new(command_tx, view_rx)
    }

    async fn run(mut self) {
        info!("Mesh coordinator started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All mesh handles dropped. Leaving room.");
                            self.leave_room().await;
                            break;
                        }
                    }
                }

                signal = self.signal_rx.recv() => {
                    match signal {
                        Some(s) => self.handle_signal(s).await,
                        None => {
                            warn!("Signaling channel closed");
                            self.leave_room().await;
                            break;
                        }
                    }
                }

                Some(event) = self.event_rx.recv() => self.handle_link_event(event).await,
            }
        }

        info!("Mesh coordinator finished");
    }

    async fn handle_command(&mut self, cmd: MeshCommand) {
        match cmd {
            MeshCommand::JoinRoom { room_id, reply } => {
                let result = self.join_room(room_id).await;
                let _ = reply.send(result);
            }

            MeshCommand::LeaveRoom { reply } => {
                self.leave_room().await;
                let _ = reply.send(Ok(()));
            }

            MeshCommand::SendChat { text, reply } => {
                let result = self.send_chat(text).await;
                let _ = reply.send(result);
            }

            MeshCommand::SetTrackEnabled {
                kind,
                enabled,
                reply,
            } => {
                // Local only: the peers just stop receiving frames.
                self.media.set_track_enabled(kind, enabled).await;
                self.view_tx.send_modify(|view| {
                    if let Some(stream) = view.local_stream.as_mut() {
                        stream.set_enabled(kind, enabled);
                    }
                });
                let _ = reply.send(Ok(()));
            }
        }
    }

    async fn handle_signal(&mut self, signal: ServerSignal) {
        match signal {
            ServerSignal::IceConfig { ice_servers } => {
                info!("Received ICE config: {} servers", ice_servers.len());
                self.ice_servers = ice_servers;
            }

            ServerSignal::Welcome { client_id } => {
                info!("Relay assigned identity {}", client_id);
                self.local_id = Some(client_id);
                self.view_tx
                    .send_modify(|view| view.local_id = Some(client_id));
            }

            ServerSignal::UserJoined { peer_id, room_id } => {
                if !self.in_room(&room_id) || self.local_id == Some(peer_id) {
                    debug!("Ignoring join of {} to '{}'", peer_id, room_id);
                    return;
                }
                if self.links.contains_key(&peer_id) {
                    debug!("Already linked to {}, ignoring join", peer_id);
                    return;
                }

                info!("{} joined '{}', offering", peer_id, room_id);
                if self
                    .open_link(peer_id, NegotiationRole::Initiator, NegotiationId::new())
                    .await
                {
                    self.feed(peer_id, LinkInput::Start).await;
                }
            }

            ServerSignal::PeerLeft { peer_id, room_id } => {
                if !self.in_room(&room_id) {
                    return;
                }
                info!("{} left '{}'", peer_id, room_id);
                self.orphan_candidates.remove(&peer_id);
                self.close_link(peer_id, CloseReason::PeerLeft).await;
            }

            ServerSignal::Offer {
                caller_id,
                negotiation_id,
                sdp,
            } => {
                if self.room_id.is_none() {
                    warn!("Ignoring offer from {}: not in a room", caller_id);
                    return;
                }

                let current = self
                    .links
                    .get(&caller_id)
                    .map(|entry| (entry.link.role(), entry.link.negotiation_id()));
                let needs_link = match current {
                    Some((_, id)) if id == negotiation_id => false,
                    // The relay keeps each sender's order, so a new id means
                    // the peer started over and the old exchange is dead.
                    Some((NegotiationRole::Responder, id)) => {
                        info!(
                            "{} restarted negotiation ({} -> {})",
                            caller_id, id, negotiation_id
                        );
                        self.close_link(caller_id, CloseReason::Superseded).await;
                        true
                    }
                    Some((NegotiationRole::Initiator, _)) => false,
                    None => true,
                };
                if needs_link
                    && !self
                        .open_link(caller_id, NegotiationRole::Responder, negotiation_id)
                        .await
                {
                    return;
                }
                self.feed(caller_id, LinkInput::RemoteOffer(negotiation_id, sdp))
                    .await;
            }

            ServerSignal::Answer {
                caller_id,
                negotiation_id,
                sdp,
            } => {
                if !self.links.contains_key(&caller_id) {
                    warn!("Ignoring answer from {}: no link", caller_id);
                    return;
                }
                self.feed(caller_id, LinkInput::RemoteAnswer(negotiation_id, sdp))
                    .await;
            }

            ServerSignal::IceCandidate {
                sender_id,
                negotiation_id,
                candidate,
            } => {
                if self.links.contains_key(&sender_id) {
                    self.feed(
                        sender_id,
                        LinkInput::RemoteCandidate(negotiation_id, candidate),
                    )
                    .await;
                } else if self.room_id.is_some() {
                    self.hold_candidate(sender_id, negotiation_id, candidate);
                }
            }

            ServerSignal::ReceiveMessage {
                room_id,
                sender_id,
                author,
                text,
            } => {
                if !self.in_room(&room_id) {
                    return;
                }
                self.view_tx.send_modify(|view| {
                    view.chat.push(ChatEntry {
                        sender_id: Some(sender_id),
                        author,
                        text,
                        is_local: false,
                    })
                });
            }
        }
    }

    async fn handle_link_event(&mut self, event: LinkEvent) {
        let LinkEvent {
            peer_id,
            epoch,
            kind,
        } = event;

        if self.links.get(&peer_id).map(|entry| entry.epoch) != Some(epoch) {
            debug!("Discarding stale event for {} (epoch {})", peer_id, epoch);
            return;
        }

        match kind {
            LinkEventKind::Completed(input) => self.feed(peer_id, input).await,

            LinkEventKind::Media(MediaEvent::CandidateGathered(candidate)) => {
                self.feed(peer_id, LinkInput::LocalCandidate(candidate))
                    .await
            }

            LinkEventKind::Media(MediaEvent::ConnectionStateChanged(state)) => {
                debug!("Media connection to {} is {:?}", peer_id, state);
                self.feed(peer_id, LinkInput::ConnectionStateChanged(state))
                    .await
            }

            LinkEventKind::Media(MediaEvent::TrackAdded { stream_id, track }) => {
                info!("Remote {:?} track from {}", track.kind, peer_id);
                self.view_tx.send_modify(|view| {
                    let stream = view
                        .remote_streams
                        .entry(peer_id)
                        .or_insert_with(|| RemoteStream {
                            stream_id,
                            tracks: Vec::new(),
                        });
                    if !stream.tracks.contains(&track) {
                        stream.tracks.push(track);
                    }
                });
            }
        }
    }

    async fn join_room(&mut self, room_id: RoomId) -> Result<(), ClientError> {
        if self.room_id.as_ref() == Some(&room_id) {
            debug!("Already in room '{}'", room_id);
            return Ok(());
        }
        self.leave_room().await;

        let (local_stream, media_error) = match self.media.local_stream().await {
            Ok(stream) => (Some(stream), None),
            Err(e) => {
                warn!("Joining '{}' without local media: {}", room_id, e);
                (None, Some(e.to_string()))
            }
        };

        info!("Joining room '{}'", room_id);
        if let Err(e) = self
            .signaling
            .send_signal(ClientSignal::JoinRoom {
                room_id: room_id.clone(),
            })
            .await
        {
            error!("Failed to join '{}': {}", room_id, e);
            return Err(e);
        }

        self.room_id = Some(room_id.clone());
        self.view_tx.send_modify(|view| {
            view.room_id = Some(room_id);
            view.local_stream = local_stream;
            view.media_error = media_error;
        });
        Ok(())
    }

    /// Release every link and tell the relay. No-op outside a room.
    async fn leave_room(&mut self) {
        let Some(room_id) = self.room_id.take() else {
            return;
        };
        info!("Leaving room '{}'", room_id);

        if let Err(e) = self
            .signaling
            .send_signal(ClientSignal::LeaveRoom {
                room_id: room_id.clone(),
            })
            .await
        {
            warn!("Could not tell the relay we left '{}': {}", room_id, e);
        }

        let peers: Vec<ClientId> = self.links.keys().copied().collect();
        for peer_id in peers {
            self.close_link(peer_id, CloseReason::LocalLeave).await;
        }
        self.orphan_candidates.clear();

        self.view_tx.send_modify(|view| {
            view.room_id = None;
            view.local_stream = None;
            view.media_error = None;
            view.peers.clear();
            view.remote_streams.clear();
            view.chat.clear();
        });
    }

    async fn send_chat(&mut self, text: String) -> Result<(), ClientError> {
        let room_id = self.room_id.clone().ok_or(ClientError::NotInRoom)?;
        if text.trim().is_empty() {
            return Ok(());
        }

        let author = self.config.display_name.clone();
        self.signaling
            .send_signal(ClientSignal::SendMessage {
                room_id,
                author: author.clone(),
                text: text.clone(),
            })
            .await?;

        let sender_id = self.local_id;
        self.view_tx.send_modify(|view| {
            view.chat.push(ChatEntry {
                sender_id,
                author,
                text,
                is_local: true,
            })
        });
        Ok(())
    }

    fn hold_candidate(
        &mut self,
        sender_id: ClientId,
        negotiation_id: NegotiationId,
        candidate: IceCandidate,
    ) {
        let senders = self.orphan_candidates.len();
        match self.orphan_candidates.entry(sender_id) {
            Entry::Vacant(_) if senders >= MAX_ORPHAN_SENDERS => {
                warn!(
                    "Dropping candidate from {}: already holding for {} senders",
                    sender_id, senders
                );
            }
            entry => {
                let held = entry.or_default();
                if held.len() < MAX_ORPHAN_CANDIDATES {
                    debug!("Holding candidate from {} until its offer", sender_id);
                    held.push((negotiation_id, candidate));
                }
            }
        }
    }

    /// Create the link toward `peer_id` with a fresh media session.
    async fn open_link(
        &mut self,
        peer_id: ClientId,
        role: NegotiationRole,
        negotiation_id: NegotiationId,
    ) -> bool {
        let epoch = self.next_epoch;
        self.next_epoch += 1;

        let sink = MediaEventSink::new(peer_id, epoch, self.event_tx.clone());
        let session = match self
            .media
            .open_session(peer_id, &self.ice_servers, sink)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to open media session for {}: {}", peer_id, e);
                self.orphan_candidates.remove(&peer_id);
                return false;
            }
        };

        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_link_worker(
            peer_id,
            epoch,
            session.clone(),
            ops_rx,
            self.event_tx.clone(),
        ));

        let timer = self.config.negotiation_timeout.map(|timeout| {
            let events = self.event_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                let _ = events.send(LinkEvent::completed(peer_id, epoch, LinkInput::TimedOut));
            })
        });

        debug!("Opened {:?} link to {} (epoch {})", role, peer_id, epoch);
        self.links.insert(
            peer_id,
            LinkEntry {
                link: PeerLink::new(peer_id, role, negotiation_id),
                epoch,
                session,
                ops_tx,
                worker,
                timer,
            },
        );

        let held = self.orphan_candidates.remove(&peer_id).unwrap_or_default();
        for (id, candidate) in held {
            if id == negotiation_id {
                self.feed(peer_id, LinkInput::RemoteCandidate(id, candidate))
                    .await;
            } else {
                debug!("Dropping held candidate from {} for negotiation {}", peer_id, id);
            }
        }
        self.publish_peers();
        true
    }

    /// Apply `input` to the link and carry out what it asks for.
    async fn feed(&mut self, peer_id: ClientId, input: LinkInput) {
        let Some(entry) = self.links.get_mut(&peer_id) else {
            return;
        };
        let actions = entry.link.handle(input);

        for action in actions {
            match action {
                LinkAction::Media(op) => {
                    if let Some(entry) = self.links.get(&peer_id) {
                        let _ = entry.ops_tx.send(op);
                    }
                }
                LinkAction::Send(signal) => {
                    if let Err(e) = self.signaling.send_signal(signal).await {
                        warn!("Failed to signal {}: {}", peer_id, e);
                    }
                }
                LinkAction::Release(reason) => self.release_link(peer_id, reason).await,
            }
        }

        self.publish_peers();
    }

    async fn close_link(&mut self, peer_id: ClientId, reason: CloseReason) {
        self.feed(peer_id, LinkInput::Close(reason)).await;
    }

    async fn release_link(&mut self, peer_id: ClientId, reason: CloseReason) {
        let Some(entry) = self.links.remove(&peer_id) else {
            return;
        };

        entry.worker.abort();
        if let Some(timer) = entry.timer {
            timer.abort();
        }
        if let Err(e) = entry.session.close().await {
            warn!("Failed to close media session for {}: {}", peer_id, e);
        }

        self.view_tx.send_modify(|view| {
            view.remote_streams.remove(&peer_id);
        });

        if reason.is_failure() {
            warn!("Link to {} failed: {:?}", peer_id, reason);
        } else {
            info!("Link to {} closed: {:?}", peer_id, reason);
        }
    }

    fn publish_peers(&self) {
        let peers: HashMap<ClientId, PeerStatus> = self
            .links
            .iter()
            .map(|(peer_id, entry)| {
                (
                    *peer_id,
                    PeerStatus {
                        role: entry.link.role(),
                        state: entry.link.state(),
                        negotiation_id: entry.link.negotiation_id(),
                    },
                )
            })
            .collect();

        self.view_tx.send_if_modified(|view| {
            if view.peers == peers {
                false
            } else {
                view.peers = peers;
                true
            }
        });
    }

    fn in_room(&self, room_id: &RoomId) -> bool {
        self.room_id.as_ref() == Some(room_id)
    }
}
