use meshroom_core::{RoomId, ServerSignal};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestClient;

fn chat_texts(signals: &[ServerSignal]) -> Vec<String> {
    signals
        .iter()
        .filter_map(|s| match s {
            ServerSignal::ReceiveMessage { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_chat_fan_out() {
    init_tracing();

    let service = create_test_relay();
    let mut a = TestClient::connect(&service).await;
    let mut b = TestClient::connect(&service).await;
    let mut c = TestClient::connect(&service).await;
    let mut outsider = TestClient::connect(&service).await;
    for client in [&a, &b, &c] {
        client.join("R1");
    }
    outsider.join("R2");
    a.drain().await;
    b.drain().await;

    a.chat("R1", "hello");

    assert!(chat_texts(&a.drain().await).is_empty(), "sender excluded");
    assert!(chat_texts(&outsider.drain().await).is_empty());

    let to_b = b.drain().await;
    assert_eq!(
        to_b,
        vec![ServerSignal::ReceiveMessage {
            room_id: RoomId::from("R1"),
            sender_id: a.client_id,
            author: "tester".to_string(),
            text: "hello".to_string(),
        }]
    );
    assert_eq!(chat_texts(&c.drain().await), vec!["hello"]);
}

#[tokio::test]
async fn test_member_who_left_misses_later_chat() {
    init_tracing();

    let service = create_test_relay();
    let a = TestClient::connect(&service).await;
    let mut b = TestClient::connect(&service).await;
    let mut c = TestClient::connect(&service).await;
    for client in [&a, &b, &c] {
        client.join("R1");
    }

    a.chat("R1", "before");
    c.leave("R1");
    a.chat("R1", "after");

    assert_eq!(chat_texts(&b.drain().await), vec!["before", "after"]);
    assert_eq!(chat_texts(&c.drain().await), vec!["before"]);
}
