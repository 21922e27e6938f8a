pub mod mesh_tests;
pub mod transport_tests;

use meshroom_server::SignalingService;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_relay() -> SignalingService {
    SignalingService::new(Vec::new())
}
