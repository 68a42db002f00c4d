//! Error types for the HTTP client.

use dxfs_api::ApiError;
use thiserror::Error;

/// Errors specific to the HTTP client.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The underlying client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// Request failed before a status was received.
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl HttpError {
    /// Wrap a `reqwest` error raised for `url`.
    ///
    /// # Arguments
    /// * `url` - URL of the failed request
    /// * `err` - The underlying error
    pub fn request(url: &str, err: reqwest::Error) -> Self {
        HttpError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Build(message) => ApiError::InvalidConfig { message },
            HttpError::Request { url, message } => ApiError::Network { url, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        let err: ApiError = HttpError::Build("no tls backend".into()).into();
        assert!(matches!(err, ApiError::InvalidConfig { .. }));

        let err: ApiError = HttpError::Request {
            url: "https://dl/x".into(),
            message: "reset".into(),
        }
        .into();
        match err {
            ApiError::Network { url, .. } => assert_eq!(url, "https://dl/x"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
