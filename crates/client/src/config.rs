use std::time::Duration;

use cursors::net::DEFAULT_SERVER_ADDR;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: String,
    pub legacy_text: bool,
    /// Cadence of the session driver loop.
    pub tick_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER_ADDR.to_string(),
            legacy_text: false,
            tick_interval: Duration::from_millis(50),
        }
    }
}
