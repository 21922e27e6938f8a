use std::time::Duration;

/// Name shown to other members when none is configured.
pub const DEFAULT_DISPLAY_NAME: &str = "Someone";

#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// Author name attached to outgoing chat messages.
    pub display_name: String,
    /// Close links that have not finished negotiating after this long.
    /// `None` leaves a stalled negotiation open until the peer leaves.
    pub negotiation_timeout: Option<Duration>,
    /// Capacity of the command queue between `MeshHandle` and the coordinator.
    pub command_buffer: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_owned(),
            negotiation_timeout: None,
            command_buffer: 32,
        }
    }
}

impl MeshConfig {
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_negotiation_timeout(mut self, timeout: Duration) -> Self {
        self.negotiation_timeout = Some(timeout);
        self
    }
}
