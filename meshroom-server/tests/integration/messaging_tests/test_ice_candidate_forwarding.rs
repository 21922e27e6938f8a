use meshroom_core::{ClientSignal, IceCandidate, NegotiationId, ServerSignal, SessionDescription};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestClient;

#[tokio::test]
async fn test_candidates_keep_sender_order_around_offer() {
    init_tracing();
    let negotiation_id = NegotiationId::new();

    let service = create_test_relay();
    let a = TestClient::connect(&service).await;
    let mut b = TestClient::connect(&service).await;

    // Candidates sent before the offer are forwarded as-is, not held back.
    a.send(ClientSignal::IceCandidate {
        target: b.client_id,
        negotiation_id,
        candidate: IceCandidate::new("early"),
    });
    a.send(ClientSignal::Offer {
        target: b.client_id,
        negotiation_id,
        sdp: SessionDescription::offer("sdp"),
    });
    a.send(ClientSignal::IceCandidate {
        target: b.client_id,
        negotiation_id,
        candidate: IceCandidate::new("late"),
    });

    let received = b.drain().await;
    assert_eq!(
        received,
        vec![
            ServerSignal::IceCandidate {
                sender_id: a.client_id,
                negotiation_id,
                candidate: IceCandidate::new("early"),
            },
            ServerSignal::Offer {
                caller_id: a.client_id,
                negotiation_id,
                sdp: SessionDescription::offer("sdp"),
            },
            ServerSignal::IceCandidate {
                sender_id: a.client_id,
                negotiation_id,
                candidate: IceCandidate::new("late"),
            },
        ]
    );
}

#[tokio::test]
async fn test_candidate_fields_pass_through_untouched() {
    init_tracing();
    let negotiation_id = NegotiationId::new();

    let service = create_test_relay();
    let a = TestClient::connect(&service).await;
    let mut b = TestClient::connect(&service).await;

    let candidate = IceCandidate {
        candidate: "candidate:842163049 1 udp 1677729535 203.0.113.7 46154 typ srflx".into(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
        username_fragment: Some("f00d".into()),
    };
    a.send(ClientSignal::IceCandidate {
        target: b.client_id,
        negotiation_id,
        candidate: candidate.clone(),
    });

    assert_eq!(
        b.next().await,
        ServerSignal::IceCandidate {
            sender_id: a.client_id,
            negotiation_id,
            candidate,
        }
    );
}
