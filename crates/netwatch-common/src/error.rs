//! Unified error types for the netwatch workspace.
//!
//! Startup failures (process enumeration, trace session) are kept apart
//! from runtime failures so callers can report them with a distinct status.

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum NetwatchError {
    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The running-process snapshot could not be taken.
    #[error("process enumeration failed: {message}")]
    ProcessEnumeration {
        /// Description of the enumeration failure.
        message: String,
    },

    /// The trace session could not be started.
    #[error("trace session error: {message}")]
    TraceSession {
        /// Description of the session failure.
        message: String,
    },

    /// An established trace stream broke down.
    #[error("trace stream error: {message}")]
    TraceStream {
        /// Description of the stream failure.
        message: String,
    },

    /// Writing a record to the output sink failed.
    #[error("output sink error: {source}")]
    Sink {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl NetwatchError {
    /// Returns `true` for failures that happen before any event is processed.
    #[must_use]
    pub const fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::ProcessEnumeration { .. } | Self::TraceSession { .. } | Self::Config { .. }
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, NetwatchError>;
