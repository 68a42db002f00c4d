//! The root directory node.

use std::fmt;
use std::sync::Arc;

use dxfs_common::{DIRECTORY_BLOCK_SIZE, DIRECTORY_SIZE, ROOT_INODE, STAT_BLOCK_SIZE};

use super::file::FileNode;
use super::types::{DirEntry, NodeAttr, NodeKind};
use crate::context::FsContext;
use crate::error::VfsError;

/// A directory of the mount. Only the root ("/") exists.
#[derive(Clone)]
pub struct DirectoryNode {
    ctx: Arc<FsContext>,
    path: String,
}

impl DirectoryNode {
    /// The root directory.
    ///
    /// # Arguments
    /// * `ctx` - Shared filesystem context
    pub fn root(ctx: Arc<FsContext>) -> Self {
        Self::at(ctx, "/")
    }

    /// Directory at an arbitrary path. Only the root answers attribute
    /// queries.
    pub fn at(ctx: Arc<FsContext>, path: impl Into<String>) -> Self {
        Self {
            ctx,
            path: path.into(),
        }
    }

    /// Path of this directory.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Check if this is the mount root.
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Inode of this directory.
    pub fn inode(&self) -> u64 {
        ROOT_INODE
    }

    /// Attribute record of the directory.
    ///
    /// # Errors
    /// Returns `VfsError::Unsupported` for any path other than the root.
    pub fn attributes(&self) -> Result<NodeAttr, VfsError> {
        if !self.is_root() {
            return Err(VfsError::unsupported(format!(
                "attributes of directory {}",
                self.path
            )));
        }
        let owner = self.ctx.owner();
        let mounted_at = self.ctx.mounted_at();
        Ok(NodeAttr {
            ino: ROOT_INODE,
            size: DIRECTORY_SIZE,
            blocks: DIRECTORY_SIZE / STAT_BLOCK_SIZE,
            atime: mounted_at,
            mtime: mounted_at,
            ctime: mounted_at,
            crtime: mounted_at,
            kind: NodeKind::Directory,
            perm: 0o777,
            nlink: 2,
            uid: owner.uid,
            gid: owner.gid,
            blksize: DIRECTORY_BLOCK_SIZE,
            ttl: self.ctx.options().kernel_cache.dir_attr_timeout,
        })
    }

    /// Every catalog file, sorted by name. `.` and `..` are left to the
    /// host adapter.
    pub fn list(&self) -> Vec<DirEntry> {
        self.ctx
            .catalog()
            .list()
            .into_iter()
            .map(|entry| DirEntry {
                inode: entry.inode,
                kind: NodeKind::File,
                name: entry.name.clone(),
            })
            .collect()
    }

    /// Resolve a name to a file node.
    ///
    /// # Arguments
    /// * `name` - File name within the directory
    ///
    /// # Errors
    /// Returns `VfsError::NotFound` if the name is not in the catalog.
    pub fn lookup(&self, name: &str) -> Result<FileNode, VfsError> {
        self.ctx
            .catalog()
            .lookup(name)
            .map(|entry| FileNode::new(self.ctx.clone(), entry))
            .ok_or_else(|| VfsError::NotFound {
                name: name.to_string(),
            })
    }
}

impl fmt::Debug for DirectoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryNode")
            .field("path", &self.path)
            .finish()
    }
}
