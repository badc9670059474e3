/*
[INPUT]:  Error sources (HTTP, command responses, serialization, push channel, local validation)
[OUTPUT]: Structured error type with the operator-facing detail text
[POS]:    Error handling layer - unified error type for entire crate
[UPDATE]: When adding new error sources or changing how failures are surfaced
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the E350 link adapter
#[derive(Error, Debug)]
pub enum LinkError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Command endpoint answered with a non-success status
    #[error("command failed (HTTP {status}): {detail}")]
    Command { status: u16, detail: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Push channel transport error
    #[error("Status stream error: {0}")]
    Stream(String),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Task id outside the selectable range
    #[error("task {0} is out of range (valid: 0..=3)")]
    InvalidTask(u8),

    /// Aux bit index outside the 16-bit mask
    #[error("aux bit {0} is out of range (valid: 0..=15)")]
    InvalidBit(u8),
}

impl LinkError {
    /// Text shown to the operator.
    ///
    /// For command failures this is the response body, verbatim.
    pub fn detail(&self) -> String {
        match self {
            LinkError::Command { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Check if the device/server rejected the command
    pub fn is_command_failure(&self) -> bool {
        matches!(self, LinkError::Command { .. })
    }

    /// Check if the failure happened below the command contract (network, stream)
    pub fn is_transport(&self) -> bool {
        matches!(self, LinkError::Http(_) | LinkError::Stream(_))
    }

    /// Create a command error from status code and body text
    pub fn command(status: StatusCode, detail: impl Into<String>) -> Self {
        LinkError::Command {
            status: status.as_u16(),
            detail: detail.into(),
        }
    }
}

/// Result type alias for link operations
pub type Result<T> = std::result::Result<T, LinkError>;
