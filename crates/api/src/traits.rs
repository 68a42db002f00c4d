//! Client trait for the platform's remote operations.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ApiError;

/// Remote operations the filesystem depends on - implemented by each backend.
///
/// Every method is exactly one network round trip. Implementations must not
/// retry: the filesystem surfaces the first failure to the caller.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Call an authenticated platform API route.
    ///
    /// # Arguments
    /// * `route` - Route relative to the API server, e.g. `file-xxxx/download`
    /// * `payload` - JSON request body
    ///
    /// # Returns
    /// The raw response body of a successful call.
    async fn call_api(&self, route: &str, payload: &serde_json::Value)
        -> Result<Vec<u8>, ApiError>;

    /// Issue a plain GET with exactly the given headers.
    ///
    /// No platform credentials are added; pre-signed URLs carry their own
    /// authorization in `headers`.
    ///
    /// # Arguments
    /// * `url` - Absolute URL
    /// * `headers` - Request headers, including `Range` for partial reads
    ///
    /// # Returns
    /// The response body verbatim. Any non-success status is an error.
    async fn http_get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<u8>, ApiError>;
}
