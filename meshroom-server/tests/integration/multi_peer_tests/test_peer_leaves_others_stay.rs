use meshroom_core::{RoomId, ServerSignal};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestClient;

#[tokio::test]
async fn test_peer_leaves_others_stay() {
    init_tracing();

    let service = create_test_relay();
    let mut a = TestClient::connect(&service).await;
    let b = TestClient::connect(&service).await;
    let mut c = TestClient::connect(&service).await;
    for client in [&a, &b, &c] {
        client.join("R1");
    }
    a.drain().await;
    c.drain().await;

    b.leave("R1");

    let left = ServerSignal::PeerLeft {
        peer_id: b.client_id,
        room_id: RoomId::from("R1"),
    };
    assert_eq!(a.drain().await, vec![left.clone()]);
    assert_eq!(c.drain().await, vec![left]);

    // Still connected, just not in the room any more.
    assert!(service.registry().is_live(&b.client_id));
    assert_eq!(
        service.directory().members(&RoomId::from("R1")),
        vec![a.client_id, c.client_id]
    );
}

#[tokio::test]
async fn test_leaving_a_room_not_joined_is_silent() {
    init_tracing();

    let service = create_test_relay();
    let mut a = TestClient::connect(&service).await;
    let b = TestClient::connect(&service).await;
    a.join("R1");

    b.leave("R1");

    assert!(a.drain().await.is_empty());
}
