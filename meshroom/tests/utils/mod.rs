pub mod relay_link;
pub mod test_peer;

pub use relay_link::*;
pub use test_peer::*;

/// Upper bound for a mesh to settle (ms).
pub const MESH_TIMEOUT_MS: u64 = 3000;
