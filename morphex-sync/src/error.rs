use std::time::Duration;

use thiserror::Error;

/// Collector and export errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Collector returned status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            SyncError::Status(status.as_u16())
        } else if err.is_decode() {
            SyncError::Malformed(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
