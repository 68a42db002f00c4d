//! Error types for platform API operations.

use thiserror::Error;

/// Errors that can occur while talking to the platform.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Request could not be sent or the body could not be received.
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// Response body was not what the protocol promises.
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ApiError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the server rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode {
            message: err.to_string(),
        }
    }
}
