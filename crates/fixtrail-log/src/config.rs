use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// How often the writer task checks the buffer for new fixes.
    pub poll_interval_ms: u64,

    /// Echo every submitted fix to the log at INFO.
    pub debug: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            debug: false,
        }
    }
}

impl WriterConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
