pub mod messaging_tests;
pub mod multi_peer_tests;

use meshroom_core::IceServerConfig;
use meshroom_server::SignalingService;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_relay() -> SignalingService {
    SignalingService::new(vec![IceServerConfig {
        urls: vec!["stun:stun.example:3478".to_string()],
        username: None,
        credential: None,
    }])
}
