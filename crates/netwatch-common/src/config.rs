//! Configuration model for a monitoring run.

use serde::{Deserialize, Serialize};

/// Rendering used for emitted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-delimited text lines, parseable positionally.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Root configuration for a monitoring run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Whether the header line is written before the first record.
    pub header: bool,
    /// Record rendering.
    pub format: OutputFormat,
    /// Abort startup when the process snapshot fails instead of
    /// continuing with an empty cache.
    pub strict_process_snapshot: bool,
    /// Bound of the channel between the trace collaborator and the worker.
    pub channel_capacity: usize,
}

impl MonitorConfig {
    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel capacity is zero.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.channel_capacity == 0 {
            return Err(crate::error::NetwatchError::Config {
                message: "channel_capacity must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            header: true,
            format: OutputFormat::Text,
            strict_process_snapshot: false,
            channel_capacity: crate::constants::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
