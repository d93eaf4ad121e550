use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Collector endpoint and timing for the sync layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base address of the collector; fixed for the lifetime of the process.
    pub collector_url: String,
    pub morph_timeout_secs: u64,
    pub save_timeout_secs: u64,
    /// Pause before handing over mock stimuli so both paths feel alike.
    pub fallback_delay_ms: u64,
    pub export_dir: PathBuf,
    /// Sends `ngrok-skip-browser-warning` so tunnels skip their interstitial page.
    pub skip_proxy_warning: bool,
}

impl SyncConfig {
    pub fn morph_timeout(&self) -> Duration {
        Duration::from_secs(self.morph_timeout_secs)
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_secs(self.save_timeout_secs)
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            collector_url: "http://127.0.0.1:5000".to_string(),
            morph_timeout_secs: 40,
            save_timeout_secs: 15,
            fallback_delay_ms: 2_000,
            export_dir: PathBuf::from("."),
            skip_proxy_warning: true,
        }
    }
}
