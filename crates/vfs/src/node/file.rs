//! File nodes backed by remote objects.

use std::fmt;
use std::sync::Arc;

use dxfs_api::{download_route, LocatorRequest};
use dxfs_common::STAT_BLOCK_SIZE;
use tracing::{debug, warn};

use super::types::{AccessMode, NodeAttr, NodeKind};
use crate::catalog::CatalogEntry;
use crate::context::FsContext;
use crate::error::VfsError;
use crate::locator::AccessLocator;
use crate::session::OpenFileSession;

/// A catalog file.
///
/// Nodes are cheap handles; a new one is created on every lookup and they
/// carry no per-node state beyond the catalog entry.
#[derive(Clone)]
pub struct FileNode {
    ctx: Arc<FsContext>,
    entry: Arc<CatalogEntry>,
}

impl FileNode {
    /// Create a node for a catalog entry.
    ///
    /// # Arguments
    /// * `ctx` - Shared filesystem context
    /// * `entry` - Catalog entry of the file
    pub fn new(ctx: Arc<FsContext>, entry: Arc<CatalogEntry>) -> Self {
        Self { ctx, entry }
    }

    /// Catalog entry of this file.
    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    /// Inode of this file.
    pub fn inode(&self) -> u64 {
        self.entry.inode
    }

    /// Name of this file.
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Shared filesystem context.
    pub(crate) fn context(&self) -> &FsContext {
        &self.ctx
    }

    /// Attribute record of the file.
    pub fn attributes(&self) -> NodeAttr {
        let owner = self.ctx.owner();
        let entry = &self.entry;
        NodeAttr {
            ino: entry.inode,
            size: entry.size,
            blocks: entry.size.div_ceil(STAT_BLOCK_SIZE),
            atime: entry.modified_at,
            mtime: entry.modified_at,
            ctime: entry.created_at,
            crtime: entry.created_at,
            kind: NodeKind::File,
            perm: 0o400,
            nlink: 1,
            uid: owner.uid,
            gid: owner.gid,
            blksize: STAT_BLOCK_SIZE as u32,
            ttl: self.ctx.options().kernel_cache.attr_ttl(),
        }
    }

    /// Open the file for reading.
    ///
    /// Write intent is rejected before any network traffic. Otherwise one
    /// download request is issued and its locator is pinned to the
    /// returned session.
    ///
    /// # Arguments
    /// * `mode` - Access mode requested by the caller
    ///
    /// # Errors
    /// - `VfsError::PermissionDenied` for write intent
    /// - `VfsError::RemoteAuthFailure` if the locator cannot be obtained
    pub async fn open(&self, mode: AccessMode) -> Result<OpenFileSession, VfsError> {
        if !mode.is_read_only() {
            return Err(VfsError::PermissionDenied {
                name: self.entry.name.clone(),
            });
        }

        let duration = self.ctx.options().locator.duration();
        let request = LocatorRequest::new(&self.entry.container_id, duration.as_secs());
        let route: String = download_route(&self.entry.object_id);

        let body: Vec<u8> = self
            .ctx
            .client()
            .call_api(&route, &request.to_payload())
            .await
            .map_err(|source| {
                if source.is_auth_failure() {
                    warn!(
                        object_id = %self.entry.object_id,
                        "API rejected the token: {}", source
                    );
                }
                VfsError::RemoteAuthFailure {
                    object_id: self.entry.object_id.clone(),
                    source,
                }
            })?;

        let locator: AccessLocator =
            AccessLocator::decode(&body, duration).map_err(|source| {
                VfsError::RemoteAuthFailure {
                    object_id: self.entry.object_id.clone(),
                    source,
                }
            })?;

        debug!(
            name = %self.entry.name,
            object_id = %self.entry.object_id,
            "obtained access locator"
        );
        Ok(OpenFileSession::new(self.clone(), locator))
    }
}

impl fmt::Debug for FileNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileNode")
            .field("entry", &self.entry)
            .finish()
    }
}
