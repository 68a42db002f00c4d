//! FUSE-based virtual filesystem over a fixed catalog of remote objects.
//!
//! This crate provides a read-only filesystem with a single flat root
//! directory. Each file is a remote, immutable platform object; opening it
//! negotiates a time-limited access locator, and every read becomes one
//! ranged HTTP GET against that locator.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: FUSE Interface (fuser::Filesystem impl, feature "fuse")
//! Layer 2: Nodes and sessions (DirectoryNode, FileNode, OpenFileSession)
//! Layer 1: Primitives (Catalog, AccessLocator, FsContext)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dxfs_vfs::{Catalog, DxVfs, FsContext, VfsOptions};
//!
//! let catalog = Arc::new(Catalog::build(objects));
//! let ctx = Arc::new(FsContext::new(catalog, client, VfsOptions::default()));
//! let vfs = DxVfs::new(ctx)?;
//! dxfs_vfs::mount(vfs, "/mnt/project".as_ref())?;
//! ```

pub mod catalog;
pub mod context;
pub mod error;
pub mod locator;
pub mod node;
pub mod options;
pub mod session;

#[cfg(feature = "fuse")]
pub mod fuse;

pub use catalog::{Catalog, CatalogEntry, ObjectMeta};
pub use context::FsContext;
pub use error::VfsError;
pub use locator::AccessLocator;
pub use node::{AccessMode, DirEntry, DirectoryNode, FileNode, Node, NodeAttr, NodeKind};
pub use options::{
    KernelCacheOptions, LocatorOptions, MountOptions, ReadAheadOptions, VfsOptions,
};
pub use session::{OpenFileSession, SessionState};

#[cfg(feature = "fuse")]
pub use fuse::{mount, spawn_mount, DxVfs};
