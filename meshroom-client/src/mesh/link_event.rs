use crate::{LinkInput, MediaEvent};
use meshroom_core::ClientId;

/// Something that happened to a link outside the coordinator: a media
/// operation finished, the session reported an event, or its timer fired.
///
/// `epoch` identifies the link instance; events for a replaced or closed
/// link are discarded.
#[derive(Debug)]
pub(crate) struct LinkEvent {
    pub peer_id: ClientId,
    pub epoch: u64,
    pub kind: LinkEventKind,
}

#[derive(Debug)]
pub(crate) enum LinkEventKind {
    Completed(LinkInput),
    Media(MediaEvent),
}

impl LinkEvent {
    pub fn completed(peer_id: ClientId, epoch: u64, input: LinkInput) -> Self {
        Self {
            peer_id,
            epoch,
            kind: LinkEventKind::Completed(input),
        }
    }

    pub fn media(peer_id: ClientId, epoch: u64, event: MediaEvent) -> Self {
        Self {
            peer_id,
            epoch,
            kind: LinkEventKind::Media(event),
        }
    }
}
