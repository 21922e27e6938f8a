//! Full-mesh audio/video rooms: a signaling relay, a client-side mesh
//! coordinator and the wire model they share.

pub use meshroom_core::{ClientId, RoomId};

pub mod model {
    pub use meshroom_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use meshroom_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshroom_client::*;
}
