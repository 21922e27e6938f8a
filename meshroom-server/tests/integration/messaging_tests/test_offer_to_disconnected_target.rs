use meshroom_core::{ClientSignal, NegotiationId, SessionDescription};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestClient;

#[tokio::test]
async fn test_offer_to_disconnected_target() {
    init_tracing();
    let negotiation_id = NegotiationId::new();

    let service = create_test_relay();
    let mut a = TestClient::connect(&service).await;
    let b = TestClient::connect(&service).await;
    let gone = b.client_id;
    b.disconnect();

    a.send(ClientSignal::Offer {
        target: gone,
        negotiation_id,
        sdp: SessionDescription::offer("lost"),
    });
    a.send(ClientSignal::Answer {
        target: gone,
        negotiation_id,
        sdp: SessionDescription::answer("lost"),
    });

    // Dropped silently: the sender hears nothing back and stays connected.
    assert!(a.drain().await.is_empty());
    assert!(service.registry().is_live(&a.client_id));
}
