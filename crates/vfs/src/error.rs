//! Error types for the VFS crate.

use dxfs_api::ApiError;
use dxfs_common::RangeError;
use thiserror::Error;

/// Errors that can occur during VFS operations.
///
/// Every error is reported straight to the calling filesystem operation;
/// nothing in this crate retries or falls back.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Name is not in the catalog.
    #[error("No such file: {name}")]
    NotFound { name: String },

    /// Inode is neither the root nor a catalog file.
    #[error("Inode not found: {0}")]
    InodeNotFound(u64),

    /// Lookup against something that is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(u64),

    /// Operation the filesystem does not implement (any mutation,
    /// attributes of a non-root directory).
    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    /// Open with write intent.
    #[error("Permission denied: {name} is read-only")]
    PermissionDenied { name: String },

    /// Access locator could not be obtained or decoded.
    #[error("Failed to obtain access locator for {object_id}: {source}")]
    RemoteAuthFailure {
        object_id: String,
        #[source]
        source: ApiError,
    },

    /// Ranged fetch failed or returned an error status.
    #[error("Ranged read of {object_id} failed: {source}")]
    RemoteReadFailure {
        object_id: String,
        #[source]
        source: ApiError,
    },

    /// Read request that cannot be expressed as a byte range.
    #[error("Invalid read range: {0}")]
    InvalidRange(#[from] RangeError),

    /// Read on a session that was already released.
    #[error("Session for {name} has been released")]
    SessionReleased { name: String },

    /// Mount operation failed.
    #[error("Mount failed: {0}")]
    MountFailed(String),
}

impl VfsError {
    /// Shorthand for `VfsError::Unsupported`.
    ///
    /// # Arguments
    /// * `operation` - Description of the rejected operation
    pub fn unsupported(operation: impl Into<String>) -> Self {
        VfsError::Unsupported {
            operation: operation.into(),
        }
    }

    /// POSIX errno reported to the kernel for this error.
    pub fn errno(&self) -> i32 {
        match self {
            VfsError::NotFound { .. } | VfsError::InodeNotFound(_) => libc::ENOENT,
            VfsError::NotADirectory(_) => libc::ENOTDIR,
            VfsError::Unsupported { .. } => libc::ENOSYS,
            VfsError::PermissionDenied { .. } => libc::EACCES,
            VfsError::RemoteAuthFailure { .. } | VfsError::RemoteReadFailure { .. } => libc::EIO,
            VfsError::InvalidRange(_) => libc::EINVAL,
            VfsError::SessionReleased { .. } => libc::EBADF,
            VfsError::MountFailed(_) => libc::EIO,
        }
    }

    /// Check if the error came from the remote side.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            VfsError::RemoteAuthFailure { .. } | VfsError::RemoteReadFailure { .. }
        )
    }
}
