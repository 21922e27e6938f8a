use crate::{ClientError, SignalingOutput};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshroom_core::{ClientSignal, ServerSignal};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

/// Signaling over a WebSocket to the relay.
///
/// Dropping every clone closes the socket.
#[derive(Clone)]
pub struct WsSignaling {
    outbound: mpsc::UnboundedSender<ClientSignal>,
}

#[async_trait]
impl SignalingOutput for WsSignaling {
    async fn send_signal(&self, signal: ClientSignal) -> Result<(), ClientError> {
        self.outbound
            .send(signal)
            .map_err(|_| ClientError::SignalingClosed)
    }
}

/// Open the relay socket at `url` (e.g. `ws://host:8080/ws`).
///
/// Returns the outbound half and a receiver of everything the relay sends.
/// The receiver ends when the socket closes.
pub async fn connect_signaling(
    url: &str,
) -> Result<(WsSignaling, mpsc::UnboundedReceiver<ServerSignal>), ClientError> {
    let (stream, _) = connect_async(url).await?;
    info!("Connected to signaling relay at {}", url);

    let (mut sink, mut source) = stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientSignal>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<ServerSignal>();

    tokio::spawn(async move {
        while let Some(signal) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&signal) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    tokio::spawn(async move {
        while let Some(Ok(msg)) = source.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ServerSignal>(&text) {
                    Ok(signal) => {
                        if inbound_tx.send(signal).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid ServerSignal from relay: {}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
        info!("Signaling connection closed");
    });

    Ok((
        WsSignaling {
            outbound: outbound_tx,
        },
        inbound_rx,
    ))
}
