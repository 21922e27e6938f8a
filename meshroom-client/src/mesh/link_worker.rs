use crate::mesh::LinkEvent;
use crate::{LinkInput, MediaError, MediaOp, MediaSession};
use meshroom_core::{ClientId, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Runs one link's media operations strictly in order and reports each
/// completion back to the coordinator.
///
/// Aborted by the coordinator when the link is released.
pub(crate) async fn run_link_worker(
    peer_id: ClientId,
    epoch: u64,
    session: Arc<dyn MediaSession>,
    mut ops: mpsc::UnboundedReceiver<MediaOp>,
    events: mpsc::UnboundedSender<LinkEvent>,
) {
    while let Some(op) = ops.recv().await {
        let completed = match op {
            MediaOp::CreateOffer => describe_locally(session.as_ref(), SdpKind::Offer)
                .await
                .map(|description| Some(LinkInput::LocalDescriptionReady(description))),

            MediaOp::CreateAnswer => describe_locally(session.as_ref(), SdpKind::Answer)
                .await
                .map(|description| Some(LinkInput::LocalDescriptionReady(description))),

            MediaOp::ApplyRemoteDescription(description) => session
                .set_remote_description(description)
                .await
                .map(|()| Some(LinkInput::RemoteDescriptionApplied)),

            // A bad candidate costs one path, not the link.
            MediaOp::AddRemoteCandidate(candidate) => {
                if let Err(e) = session.add_ice_candidate(candidate).await {
                    warn!("Failed to add ICE candidate from {}: {}", peer_id, e);
                }
                Ok(None)
            }
        };

        let input = match completed {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => LinkInput::OperationFailed(e.to_string()),
        };

        if events
            .send(LinkEvent::completed(peer_id, epoch, input))
            .is_err()
        {
            break;
        }
    }
}

async fn describe_locally(
    session: &dyn MediaSession,
    kind: SdpKind,
) -> Result<SessionDescription, MediaError> {
    let description = match kind {
        SdpKind::Offer => session.create_offer().await?,
        SdpKind::Answer => session.create_answer().await?,
    };
    session.set_local_description(description.clone()).await?;
    Ok(description)
}
