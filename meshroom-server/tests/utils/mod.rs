pub mod signal_helpers;
pub mod test_client;

pub use signal_helpers::*;
pub use test_client::*;
pub use ws_client::*;
