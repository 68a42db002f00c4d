//! Filesystem nodes.
//!
//! A mount has exactly two kinds of node: the root directory and the files
//! in it. `Node` dispatches the shared operation set explicitly; operations
//! that make no sense for a variant return an error instead of being absent.

mod dir;
mod file;
mod types;

pub use dir::DirectoryNode;
pub use file::FileNode;
pub use types::{AccessMode, DirEntry, NodeAttr, NodeKind};

use crate::error::VfsError;
use crate::session::OpenFileSession;

/// A node of the mount.
#[derive(Debug, Clone)]
pub enum Node {
    /// The root directory.
    Directory(DirectoryNode),
    /// A catalog file.
    File(FileNode),
}

impl Node {
    /// Inode of this node.
    pub fn inode(&self) -> u64 {
        match self {
            Node::Directory(dir) => dir.inode(),
            Node::File(file) => file.inode(),
        }
    }

    /// Kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Directory(_) => NodeKind::Directory,
            Node::File(_) => NodeKind::File,
        }
    }

    /// Attribute record for this node.
    pub fn attributes(&self) -> Result<NodeAttr, VfsError> {
        match self {
            Node::Directory(dir) => dir.attributes(),
            Node::File(file) => Ok(file.attributes()),
        }
    }

    /// Resolve a child by name.
    ///
    /// # Arguments
    /// * `name` - Child name
    ///
    /// # Errors
    /// Returns `VfsError::NotADirectory` on a file.
    pub fn lookup(&self, name: &str) -> Result<Node, VfsError> {
        match self {
            Node::Directory(dir) => dir.lookup(name).map(Node::File),
            Node::File(file) => Err(VfsError::NotADirectory(file.inode())),
        }
    }

    /// Open for reading.
    ///
    /// # Arguments
    /// * `mode` - Access mode requested by the caller
    ///
    /// # Errors
    /// Returns `VfsError::Unsupported` on a directory.
    pub async fn open(&self, mode: AccessMode) -> Result<OpenFileSession, VfsError> {
        match self {
            Node::Directory(dir) => Err(VfsError::unsupported(format!(
                "open directory {}",
                dir.path()
            ))),
            Node::File(file) => file.open(mode).await,
        }
    }
}
