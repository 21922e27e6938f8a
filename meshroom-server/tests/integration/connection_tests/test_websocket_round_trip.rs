use meshroom_core::{ClientSignal, IceCandidate, NegotiationId, RoomId, ServerSignal};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{WsTestClient, spawn_relay};

async fn welcome(client: &mut WsTestClient) -> meshroom_core::ClientId {
    assert!(matches!(
        client.recv().await.expect("ice-config"),
        ServerSignal::IceConfig { .. }
    ));
    match client.recv().await.expect("welcome") {
        ServerSignal::Welcome { client_id } => client_id,
        other => panic!("Expected welcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_websocket_round_trip() {
    init_tracing();
    let negotiation_id = NegotiationId::new();

    let service = create_test_relay();
    let addr = spawn_relay(service.clone()).await.expect("relay failed to start");

    let mut a = WsTestClient::connect(addr).await.expect("client a");
    let a_id = welcome(&mut a).await;
    a.send(&ClientSignal::JoinRoom {
        room_id: RoomId::from("R1"),
    })
    .await
    .unwrap();

    let mut b = WsTestClient::connect(addr).await.expect("client b");
    let b_id = welcome(&mut b).await;

    // Garbage is logged and skipped, the connection stays usable.
    b.send_raw("{not json").await.unwrap();
    b.send(&ClientSignal::JoinRoom {
        room_id: RoomId::from("R1"),
    })
    .await
    .unwrap();

    assert_eq!(
        a.recv().await.unwrap(),
        ServerSignal::UserJoined {
            peer_id: b_id,
            room_id: RoomId::from("R1"),
        }
    );

    a.send(&ClientSignal::IceCandidate {
        target: b_id,
        negotiation_id,
        candidate: IceCandidate::new("candidate:1"),
    })
    .await
    .unwrap();
    assert_eq!(
        b.recv().await.unwrap(),
        ServerSignal::IceCandidate {
            sender_id: a_id,
            negotiation_id,
            candidate: IceCandidate::new("candidate:1"),
        }
    );

    b.close().await.unwrap();
    assert_eq!(
        a.recv().await.unwrap(),
        ServerSignal::PeerLeft {
            peer_id: b_id,
            room_id: RoomId::from("R1"),
        }
    );
    assert!(!service.registry().is_live(&b_id));
}
