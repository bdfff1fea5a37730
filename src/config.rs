//! Pipeline settings and per-source configuration files.
//!
//! A deployment is described by one JSON document:
//!
//! ```json
//! {
//!   "transport": { "type": "serial", "path": "/dev/ttyUSB0", "baud_rate": 921600 },
//!   "format": {
//!     "start": [170],
//!     "length": { "kind": "u16", "order": "little" },
//!     "trailer": { "kind": "xor" },
//!     "payload_multiple": 4
//!   },
//!   "pipeline": { "rate_window": 30, "stale_after_ms": 5000 }
//! }
//! ```
//!
//! Every section except `transport` may be omitted and falls back to its
//! default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorwireError};
use crate::protocol::{FrameFormat, DEFAULT_BUFFER_CEILING};
use crate::rate::DEFAULT_RATE_WINDOW;
use crate::transport::TransportConfig;

/// Default size of a single transport read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Default transport read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Default pause after which buffered partial bytes are discarded.
pub const DEFAULT_STALE_AFTER_MS: u64 = 5000;

/// Tunables for the read loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Accumulator ceiling in bytes.
    pub buffer_ceiling: usize,
    /// Bytes requested per transport read.
    pub read_buffer_size: usize,
    /// Upper bound on a single read wait.
    pub read_timeout_ms: u64,
    /// Timestamps kept by each rate tracker.
    pub rate_window: usize,
    /// Silence after which a partial frame is dropped (0 disables).
    pub stale_after_ms: u64,
}

impl PipelineSettings {
    /// Read timeout as a `Duration`.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Stale-buffer threshold, if enabled.
    pub fn stale_after(&self) -> Option<Duration> {
        (self.stale_after_ms > 0).then(|| Duration::from_millis(self.stale_after_ms))
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_ceiling == 0 {
            return Err(SensorwireError::Config(
                "buffer_ceiling must be greater than zero".to_string(),
            ));
        }
        if self.read_buffer_size == 0 {
            return Err(SensorwireError::Config(
                "read_buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(SensorwireError::Config(
                "read_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.rate_window < 2 {
            return Err(SensorwireError::Config(format!(
                "rate_window must be at least 2, got {}",
                self.rate_window
            )));
        }
        Ok(())
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            buffer_ceiling: DEFAULT_BUFFER_CEILING,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            rate_window: DEFAULT_RATE_WINDOW,
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
        }
    }
}

/// Everything needed to open and decode one data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Where the bytes come from.
    pub transport: TransportConfig,
    /// Frame layout.
    #[serde(default)]
    pub format: FrameFormat,
    /// Read loop tunables.
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

impl SourceConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the format and settings together.
    pub fn validate(&self) -> Result<()> {
        self.format.validate()?;
        self.pipeline.validate()?;

        if self.pipeline.buffer_ceiling < self.format.max_frame_len() {
            return Err(SensorwireError::Config(format!(
                "buffer_ceiling {} cannot hold a {} byte frame",
                self.pipeline.buffer_ceiling,
                self.format.max_frame_len()
            )));
        }
        Ok(())
    }
}
