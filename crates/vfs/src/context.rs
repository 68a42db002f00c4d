//! The filesystem instance shared by every node of a mount.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use dxfs_api::ApiClient;
use dxfs_common::{current_owner, Owner, ROOT_INODE};

use crate::catalog::Catalog;
use crate::error::VfsError;
use crate::node::{DirectoryNode, FileNode, Node};
use crate::options::VfsOptions;

/// State shared by all nodes and sessions of one mount.
///
/// Everything here is fixed at construction. Nodes hold an `Arc` to it and
/// never outlive it in practice, since the host drops them before unmount.
pub struct FsContext {
    /// Files exposed by the mount.
    catalog: Arc<Catalog>,
    /// Remote collaborator for locators and ranged reads.
    client: Arc<dyn ApiClient>,
    /// Owner reported for every node.
    owner: Owner,
    /// Mount options.
    options: VfsOptions,
    /// Timestamp reported for the root directory.
    mounted_at: SystemTime,
}

impl FsContext {
    /// Create a context owned by the current user.
    ///
    /// # Arguments
    /// * `catalog` - Files to expose
    /// * `client` - Remote collaborator
    /// * `options` - VFS options
    pub fn new(catalog: Arc<Catalog>, client: Arc<dyn ApiClient>, options: VfsOptions) -> Self {
        Self {
            catalog,
            client,
            owner: current_owner(),
            options,
            mounted_at: SystemTime::now(),
        }
    }

    /// Override the reported owner.
    ///
    /// # Arguments
    /// * `owner` - uid/gid to report
    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    /// The catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The remote collaborator.
    pub fn client(&self) -> &dyn ApiClient {
        self.client.as_ref()
    }

    /// Owner reported for every node.
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Mount options.
    pub fn options(&self) -> &VfsOptions {
        &self.options
    }

    /// When this context was created.
    pub fn mounted_at(&self) -> SystemTime {
        self.mounted_at
    }

    /// The root directory.
    pub fn root(self: &Arc<Self>) -> DirectoryNode {
        DirectoryNode::root(self.clone())
    }

    /// Resolve an inode to a node.
    ///
    /// # Arguments
    /// * `inode` - Root inode or a catalog inode
    ///
    /// # Errors
    /// Returns `VfsError::InodeNotFound` for anything else.
    pub fn node(self: &Arc<Self>, inode: u64) -> Result<Node, VfsError> {
        if inode == ROOT_INODE {
            return Ok(Node::Directory(self.root()));
        }
        self.catalog
            .get(inode)
            .map(|entry| Node::File(FileNode::new(self.clone(), entry)))
            .ok_or(VfsError::InodeNotFound(inode))
    }
}

impl fmt::Debug for FsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsContext")
            .field("files", &self.catalog.len())
            .field("owner", &self.owner)
            .field("options", &self.options)
            .field("mounted_at", &self.mounted_at)
            .finish_non_exhaustive()
    }
}
