//! Wire types for the access-locator protocol.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Header used to restrict a GET to a byte range.
pub const RANGE_HEADER: &str = "Range";

/// Route that issues a download locator for an object.
///
/// # Arguments
/// * `object_id` - Remote object identifier (e.g. `file-xxxx`)
pub fn download_route(object_id: &str) -> String {
    format!("{}/download", object_id)
}

/// Body of a `<objectId>/download` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorRequest {
    /// Container (project) the object is read through.
    pub project: String,
    /// Requested validity in seconds.
    pub duration: u64,
}

impl LocatorRequest {
    /// Create a new locator request.
    ///
    /// # Arguments
    /// * `project` - Container identifier
    /// * `duration` - Requested validity in seconds
    pub fn new(project: impl Into<String>, duration: u64) -> Self {
        Self {
            project: project.into(),
            duration,
        }
    }

    /// Serialize into the JSON payload expected by the API.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "project": self.project,
            "duration": self.duration,
        })
    }
}

/// Response of a `<objectId>/download` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadUrl {
    /// Base URL for ranged GETs.
    pub url: String,
    /// Headers that must accompany every GET.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl DownloadUrl {
    /// Decode a response body.
    ///
    /// # Arguments
    /// * `body` - Raw JSON response
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}
