use meshroom_core::ServerSignal;
use tokio::sync::mpsc;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::next_signal;

#[tokio::test]
async fn test_handshake_assigns_identity() {
    init_tracing();

    let service = create_test_relay();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let client_id = service.connect(tx);

    // ICE servers come first so the client can build peer connections
    // before any offer reaches it.
    match next_signal(&mut rx).await {
        ServerSignal::IceConfig { ice_servers } => {
            assert_eq!(ice_servers, service.get_ice_servers());
        }
        other => panic!("Expected ice-config, got {:?}", other),
    }
    assert_eq!(
        next_signal(&mut rx).await,
        ServerSignal::Welcome { client_id }
    );
    assert!(service.registry().is_live(&client_id));
}

#[tokio::test]
async fn test_each_connection_gets_a_new_identity() {
    init_tracing();

    let service = create_test_relay();
    let (tx, _rx) = mpsc::unbounded_channel();

    let first = service.connect(tx.clone());
    service.disconnect(first);
    let second = service.connect(tx);

    assert_ne!(first, second);
    assert!(!service.registry().is_live(&first));
}
