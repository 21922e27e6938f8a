use crate::MediaConnectionState;
use meshroom_core::{ClientId, ClientSignal, IceCandidate, NegotiationId, SessionDescription};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationRole {
    /// Already in the room when the peer arrived; sends the offer.
    Initiator,
    /// Newcomer; answers the offer it receives.
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    LocalOfferPending,
    AwaitingAnswer,
    RemoteOfferReceived,
    LocalAnswerPending,
    Connected,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalDescription {
    None,
    Creating,
    Signaled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteDescription {
    None,
    Applying,
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    PeerLeft,
    LocalLeave,
    NegotiationFailed(String),
    ConnectionFailed,
    ConnectionClosed,
    TimedOut,
    /// The peer opened a new negotiation that replaces this one.
    Superseded,
}

impl CloseReason {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CloseReason::NegotiationFailed(_) | CloseReason::ConnectionFailed | CloseReason::TimedOut
        )
    }
}

/// Everything that can happen to a link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkInput {
    /// Begin negotiating. Only meaningful for an idle initiator.
    Start,
    RemoteOffer(NegotiationId, SessionDescription),
    RemoteAnswer(NegotiationId, SessionDescription),
    RemoteCandidate(NegotiationId, IceCandidate),
    /// Candidate gathered by the local media session.
    LocalCandidate(IceCandidate),
    /// The local offer or answer was created and applied.
    LocalDescriptionReady(SessionDescription),
    RemoteDescriptionApplied,
    /// A media operation rejected its input.
    OperationFailed(String),
    ConnectionStateChanged(MediaConnectionState),
    TimedOut,
    Close(CloseReason),
}

/// Work for the media session. Executed strictly in order.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaOp {
    /// Create an offer and apply it as the local description.
    CreateOffer,
    /// Create an answer and apply it as the local description.
    CreateAnswer,
    ApplyRemoteDescription(SessionDescription),
    AddRemoteCandidate(IceCandidate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkAction {
    Media(MediaOp),
    Send(ClientSignal),
    /// The link is closed; release its media session.
    Release(CloseReason),
}

/// Negotiation with one remote peer.
///
/// A pure state machine: inputs go in through [`PeerLink::handle`], actions
/// come out, and the caller performs them. Remote candidates are held until
/// the remote description is applied, local candidates until the local
/// description has been signaled, and an answer that overtakes the local
/// offer waits for it. Remote inputs tagged with another negotiation id
/// belong to an earlier exchange and are dropped. Once closed, every input
/// is ignored.
#[derive(Debug)]
pub struct PeerLink {
    peer_id: ClientId,
    role: NegotiationRole,
    negotiation_id: NegotiationId,
    state: NegotiationState,
    local_description: LocalDescription,
    remote_description: RemoteDescription,
    pending_answer: Option<SessionDescription>,
    pending_remote_candidates: Vec<IceCandidate>,
    pending_local_candidates: Vec<IceCandidate>,
}

impl PeerLink {
    /// An initiator mints `negotiation_id` for its offer; a responder takes
    /// the one carried by the offer it answers.
    pub fn new(peer_id: ClientId, role: NegotiationRole, negotiation_id: NegotiationId) -> Self {
        Self {
            peer_id,
            role,
            negotiation_id,
            state: NegotiationState::Idle,
            local_description: LocalDescription::None,
            remote_description: RemoteDescription::None,
            pending_answer: None,
            pending_remote_candidates: Vec::new(),
            pending_local_candidates: Vec::new(),
        }
    }

    pub fn peer_id(&self) -> ClientId {
        self.peer_id
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn negotiation_id(&self) -> NegotiationId {
        self.negotiation_id
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == NegotiationState::Closed
    }

    pub fn pending_remote_candidates(&self) -> &[IceCandidate] {
        &self.pending_remote_candidates
    }

    pub fn pending_local_candidates(&self) -> &[IceCandidate] {
        &self.pending_local_candidates
    }

    pub fn handle(&mut self, input: LinkInput) -> Vec<LinkAction> {
        if self.is_closed() {
            return Vec::new();
        }

        match input {
            LinkInput::Start => self.start(),
            LinkInput::RemoteOffer(id, _)
            | LinkInput::RemoteAnswer(id, _)
            | LinkInput::RemoteCandidate(id, _)
                if id != self.negotiation_id =>
            {
                debug!(
                    "Ignoring signal from {} for negotiation {}, current is {}",
                    self.peer_id, id, self.negotiation_id
                );
                Vec::new()
            }
            LinkInput::RemoteOffer(_, offer) => self.on_remote_offer(offer),
            LinkInput::RemoteAnswer(_, answer) => self.on_remote_answer(answer),
            LinkInput::RemoteCandidate(_, candidate) => self.on_remote_candidate(candidate),
            LinkInput::LocalCandidate(candidate) => self.on_local_candidate(candidate),
            LinkInput::LocalDescriptionReady(description) => {
                self.on_local_description_ready(description)
            }
            LinkInput::RemoteDescriptionApplied => self.on_remote_description_applied(),
            LinkInput::OperationFailed(reason) => {
                self.close(CloseReason::NegotiationFailed(reason))
            }
            LinkInput::ConnectionStateChanged(state) => match state {
                MediaConnectionState::Failed => self.close(CloseReason::ConnectionFailed),
                MediaConnectionState::Closed => self.close(CloseReason::ConnectionClosed),
                _ => Vec::new(),
            },
            LinkInput::TimedOut => {
                if self.state == NegotiationState::Connected {
                    Vec::new()
                } else {
                    self.close(CloseReason::TimedOut)
                }
            }
            LinkInput::Close(reason) => self.close(reason),
        }
    }

    fn start(&mut self) -> Vec<LinkAction> {
        if self.role != NegotiationRole::Initiator || self.state != NegotiationState::Idle {
            debug!("Ignoring start for {} in {:?}", self.peer_id, self.state);
            return Vec::new();
        }

        self.state = NegotiationState::LocalOfferPending;
        self.local_description = LocalDescription::Creating;
        vec![LinkAction::Media(MediaOp::CreateOffer)]
    }

    fn on_remote_offer(&mut self, offer: SessionDescription) -> Vec<LinkAction> {
        if self.role != NegotiationRole::Responder || self.state != NegotiationState::Idle {
            warn!(
                "Ignoring offer from {}: link is {:?} in {:?}",
                self.peer_id, self.role, self.state
            );
            return Vec::new();
        }

        self.state = NegotiationState::RemoteOfferReceived;
        self.remote_description = RemoteDescription::Applying;
        vec![LinkAction::Media(MediaOp::ApplyRemoteDescription(offer))]
    }

    fn on_remote_answer(&mut self, answer: SessionDescription) -> Vec<LinkAction> {
        if self.role != NegotiationRole::Initiator {
            warn!("Ignoring answer from {}: we did not offer", self.peer_id);
            return Vec::new();
        }

        match (self.state, self.remote_description) {
            (NegotiationState::LocalOfferPending, _) if self.pending_answer.is_none() => {
                debug!("Answer from {} arrived before our offer settled", self.peer_id);
                self.pending_answer = Some(answer);
                Vec::new()
            }
            (NegotiationState::AwaitingAnswer, RemoteDescription::None) => {
                self.remote_description = RemoteDescription::Applying;
                vec![LinkAction::Media(MediaOp::ApplyRemoteDescription(answer))]
            }
            _ => {
                warn!(
                    "Ignoring duplicate answer from {} in {:?}",
                    self.peer_id, self.state
                );
                Vec::new()
            }
        }
    }

    fn on_remote_candidate(&mut self, candidate: IceCandidate) -> Vec<LinkAction> {
        if self.remote_description == RemoteDescription::Applied {
            vec![LinkAction::Media(MediaOp::AddRemoteCandidate(candidate))]
        } else {
            self.pending_remote_candidates.push(candidate);
            Vec::new()
        }
    }

    fn on_local_candidate(&mut self, candidate: IceCandidate) -> Vec<LinkAction> {
        if self.local_description == LocalDescription::Signaled {
            vec![self.candidate_signal(candidate)]
        } else {
            self.pending_local_candidates.push(candidate);
            Vec::new()
        }
    }

    fn on_local_description_ready(&mut self, description: SessionDescription) -> Vec<LinkAction> {
        if self.local_description != LocalDescription::Creating {
            debug!("Unexpected local description for {}", self.peer_id);
            return Vec::new();
        }
        self.local_description = LocalDescription::Signaled;

        let mut actions = Vec::new();
        match self.state {
            NegotiationState::LocalOfferPending => {
                self.state = NegotiationState::AwaitingAnswer;
                actions.push(LinkAction::Send(ClientSignal::Offer {
                    target: self.peer_id,
                    negotiation_id: self.negotiation_id,
                    sdp: description,
                }));
            }
            NegotiationState::LocalAnswerPending => {
                self.state = NegotiationState::Connected;
                actions.push(LinkAction::Send(ClientSignal::Answer {
                    target: self.peer_id,
                    negotiation_id: self.negotiation_id,
                    sdp: description,
                }));
            }
            _ => return actions,
        }

        let flushed: Vec<_> = self.pending_local_candidates.drain(..).collect();
        for candidate in flushed {
            actions.push(self.candidate_signal(candidate));
        }

        if let Some(answer) = self.pending_answer.take() {
            self.remote_description = RemoteDescription::Applying;
            actions.push(LinkAction::Media(MediaOp::ApplyRemoteDescription(answer)));
        }

        actions
    }

    fn on_remote_description_applied(&mut self) -> Vec<LinkAction> {
        if self.remote_description != RemoteDescription::Applying {
            debug!("Unexpected remote description completion for {}", self.peer_id);
            return Vec::new();
        }
        self.remote_description = RemoteDescription::Applied;

        let mut actions: Vec<_> = self
            .pending_remote_candidates
            .drain(..)
            .map(|candidate| LinkAction::Media(MediaOp::AddRemoteCandidate(candidate)))
            .collect();

        match self.state {
            NegotiationState::AwaitingAnswer => self.state = NegotiationState::Connected,
            NegotiationState::RemoteOfferReceived => {
                self.state = NegotiationState::LocalAnswerPending;
                self.local_description = LocalDescription::Creating;
                actions.push(LinkAction::Media(MediaOp::CreateAnswer));
            }
            _ => {}
        }

        actions
    }

    fn close(&mut self, reason: CloseReason) -> Vec<LinkAction> {
        self.state = NegotiationState::Closed;
        self.pending_answer = None;
        self.pending_remote_candidates.clear();
        self.pending_local_candidates.clear();
        vec![LinkAction::Release(reason)]
    }

    fn candidate_signal(&self, candidate: IceCandidate) -> LinkAction {
        LinkAction::Send(ClientSignal::IceCandidate {
            target: self.peer_id,
            negotiation_id: self.negotiation_id,
            candidate,
        })
    }
}
