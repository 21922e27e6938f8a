use meshroom_core::{RoomId, ServerSignal};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestClient;

#[tokio::test]
async fn test_disconnect_announces_departure() {
    init_tracing();

    let service = create_test_relay();
    let mut a = TestClient::connect(&service).await;
    let mut b = TestClient::connect(&service).await;
    let mut c = TestClient::connect(&service).await;

    a.join("R1");
    a.join("R2");
    b.join("R1");
    c.join("R2");
    a.drain().await;

    a.disconnect();

    assert_eq!(
        b.drain().await.last(),
        Some(&ServerSignal::PeerLeft {
            peer_id: a.client_id,
            room_id: RoomId::from("R1"),
        })
    );
    assert_eq!(
        c.drain().await.last(),
        Some(&ServerSignal::PeerLeft {
            peer_id: a.client_id,
            room_id: RoomId::from("R2"),
        })
    );
    assert!(service.directory().rooms_of(a.client_id).is_empty());
    assert_eq!(service.directory().members(&RoomId::from("R1")), vec![b.client_id]);
    assert_eq!(service.directory().members(&RoomId::from("R2")), vec![c.client_id]);
}

#[tokio::test]
async fn test_double_disconnect_is_a_no_op() {
    init_tracing();

    let service = create_test_relay();
    let a = TestClient::connect(&service).await;
    let mut b = TestClient::connect(&service).await;
    a.join("R1");
    b.join("R1");

    a.disconnect();
    a.disconnect();

    let departures = b
        .drain()
        .await
        .into_iter()
        .filter(|s| matches!(s, ServerSignal::PeerLeft { .. }))
        .count();
    assert_eq!(departures, 1);
}

#[tokio::test]
async fn test_last_member_leaving_empties_room() {
    init_tracing();

    let service = create_test_relay();
    let a = TestClient::connect(&service).await;
    a.join("R1");
    assert_eq!(service.directory().room_count(), 1);

    a.disconnect();

    assert_eq!(service.directory().room_count(), 0);
    assert_eq!(service.registry().live_count(), 0);
}
