//! Time-limited access locators for remote objects.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use dxfs_api::{ApiError, DownloadUrl};

/// A pre-authorized URL plus the headers that must accompany every GET.
///
/// Issued once per open and owned by that open's session. There is no
/// renewal path: a locator that expires mid-session keeps being used and
/// the remote side decides whether to honor it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLocator {
    /// Base URL for ranged GETs.
    pub url: String,
    /// Fixed headers sent with every GET. Never mutated after issuance.
    pub headers: HashMap<String, String>,
    /// When the locator was received.
    pub issued_at: SystemTime,
    /// Validity requested at issuance.
    pub duration: Duration,
}

impl AccessLocator {
    /// Create a locator issued now.
    ///
    /// # Arguments
    /// * `url` - Base URL
    /// * `headers` - Headers required by the URL
    /// * `duration` - Requested validity
    pub fn new(
        url: impl Into<String>,
        headers: HashMap<String, String>,
        duration: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            headers,
            issued_at: SystemTime::now(),
            duration,
        }
    }

    /// Decode the response of a `<objectId>/download` call.
    ///
    /// # Arguments
    /// * `body` - Raw JSON response
    /// * `duration` - Validity that was requested
    ///
    /// # Errors
    /// Returns `ApiError::Decode` if the body is not a download URL or the
    /// URL is empty.
    pub fn decode(body: &[u8], duration: Duration) -> Result<Self, ApiError> {
        let download: DownloadUrl = DownloadUrl::from_slice(body)?;
        if download.url.trim().is_empty() {
            return Err(ApiError::Decode {
                message: "download response has an empty url".into(),
            });
        }
        Ok(Self::new(download.url, download.headers, duration))
    }

    /// URL that serves the object's bytes through `container_id`.
    ///
    /// # Arguments
    /// * `container_id` - Container the object is read through
    ///
    /// # Returns
    /// `<url>/<container_id>`
    pub fn object_url(&self, container_id: &str) -> String {
        format!("{}/{}", self.url, container_id)
    }

    /// Nominal expiry time.
    pub fn expires_at(&self) -> SystemTime {
        self.issued_at + self.duration
    }

    /// Check whether the nominal expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    /// Check expiry against an explicit clock reading.
    ///
    /// # Arguments
    /// * `now` - Current time
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expires_at()
    }
}
