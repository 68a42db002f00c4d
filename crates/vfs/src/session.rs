//! Open file sessions.
//!
//! A session pins one access locator for its lifetime. Reads translate
//! `(offset, length)` into a single ranged GET against that locator; there
//! is no caching, no retry and no locator renewal.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use dxfs_api::RANGE_HEADER;
use dxfs_common::ByteRange;
use tracing::{debug, warn};

use crate::error::VfsError;
use crate::locator::AccessLocator;
use crate::node::FileNode;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Locator held, reads allowed.
    Opened,
    /// Locator dropped, reads rejected.
    Released,
}

/// An open, read-only file.
#[derive(Debug)]
pub struct OpenFileSession {
    file: FileNode,
    locator: RwLock<Option<Arc<AccessLocator>>>,
}

impl OpenFileSession {
    /// Create a session holding `locator`.
    ///
    /// # Arguments
    /// * `file` - File this session reads
    /// * `locator` - Locator obtained at open time
    pub fn new(file: FileNode, locator: AccessLocator) -> Self {
        Self {
            file,
            locator: RwLock::new(Some(Arc::new(locator))),
        }
    }

    /// File this session reads.
    pub fn file(&self) -> &FileNode {
        &self.file
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        match self.locator() {
            Some(_) => SessionState::Opened,
            None => SessionState::Released,
        }
    }

    /// Locator held by the session, if still open.
    pub fn locator(&self) -> Option<Arc<AccessLocator>> {
        self.locator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read up to `length` bytes at `offset`.
    ///
    /// Requests past the end of the object are clipped to it; a request
    /// that starts at or past the end returns no bytes without touching the
    /// network. The `Range` header therefore matches the raw request
    /// `bytes=offset-(offset+length-1)` except when that request runs past
    /// the end. The response body is returned as-is.
    ///
    /// # Arguments
    /// * `offset` - Absolute byte offset
    /// * `length` - Maximum number of bytes to return
    ///
    /// # Errors
    /// - `VfsError::SessionReleased` after `release`
    /// - `VfsError::RemoteReadFailure` if the fetch fails
    pub async fn read(&self, offset: u64, length: u32) -> Result<Vec<u8>, VfsError> {
        let entry = self.file.entry();
        let locator: Arc<AccessLocator> =
            self.locator().ok_or_else(|| VfsError::SessionReleased {
                name: entry.name.clone(),
            })?;

        let range: ByteRange = match ByteRange::clamped(offset, length as u64, entry.size)? {
            Some(range) => range,
            None => return Ok(Vec::new()),
        };

        if locator.is_expired() {
            warn!(
                name = %entry.name,
                object_id = %entry.object_id,
                "access locator has expired, reading anyway"
            );
        }

        let mut headers: HashMap<String, String> = locator.headers.clone();
        headers.retain(|key, _| !key.eq_ignore_ascii_case(RANGE_HEADER));
        headers.insert(RANGE_HEADER.to_string(), range.header_value());

        let url: String = locator.object_url(&entry.container_id);
        let data: Vec<u8> = self
            .file
            .context()
            .client()
            .http_get(&url, &headers)
            .await
            .map_err(|source| VfsError::RemoteReadFailure {
                object_id: entry.object_id.clone(),
                source,
            })?;

        debug!(
            name = %entry.name,
            range = %range,
            received = data.len(),
            "ranged read"
        );
        Ok(data)
    }

    /// Drop the locator. Later reads fail; releasing twice is a no-op.
    pub fn release(&self) {
        let previous = self
            .locator
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!(name = %self.file.name(), "session released");
        }
    }
}
