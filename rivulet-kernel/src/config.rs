//! Session configuration.

use serde::Deserialize;
use std::time::Duration;

/// Port the browser talks to when the frontend runs from a dev server.
const DEV_SERVER_PORT: u16 = 3000;

/// Shortest period the delivery loop runs at.
pub const MIN_DELIVERY_INTERVAL: Duration = Duration::from_millis(1);

/// Options that shape a session's manifest and delivery cadence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportConfig {
    /// Port the renderer connects to.
    pub server_port: u16,
    /// Address advertised in running manifests, if configured.
    pub server_address: Option<String>,
    /// Internal development mode.
    pub development_mode: bool,
    /// Serve the frontend from a separate dev server (development mode only).
    pub use_node: bool,
    /// How often the browser queue is drained.
    pub delivery_interval_ms: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            server_port: 8501,
            server_address: None,
            development_mode: false,
            use_node: true,
            delivery_interval_ms: 10,
        }
    }
}

impl ReportConfig {
    /// Parse a JSON config document. Missing keys keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Port shown in the browser's address bar.
    pub fn browser_port(&self) -> u16 {
        if self.development_mode && self.use_node {
            DEV_SERVER_PORT
        } else {
            self.server_port
        }
    }

    /// Delivery period, never shorter than [`MIN_DELIVERY_INTERVAL`].
    pub fn delivery_interval(&self) -> Duration {
        Duration::from_millis(self.delivery_interval_ms).max(MIN_DELIVERY_INTERVAL)
    }
}
