//! Attribute and listing types shared by all nodes.

use std::time::{Duration, SystemTime};

/// Type of node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// Host-independent attribute record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttr {
    /// Inode.
    pub ino: u64,
    /// Size in bytes.
    pub size: u64,
    /// Size in 512-byte blocks.
    pub blocks: u64,
    /// Last access time.
    pub atime: SystemTime,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last status change time.
    pub ctime: SystemTime,
    /// Creation time.
    pub crtime: SystemTime,
    /// Node kind.
    pub kind: NodeKind,
    /// Permission bits.
    pub perm: u16,
    /// Hard link count.
    pub nlink: u32,
    /// Owner user ID.
    pub uid: u32,
    /// Owner group ID.
    pub gid: u32,
    /// Preferred I/O block size.
    pub blksize: u32,
    /// How long the host may cache this record.
    pub ttl: Duration,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode of the entry.
    pub inode: u64,
    /// Kind of the entry.
    pub kind: NodeKind,
    /// Entry name.
    pub name: String,
}

/// Access requested by an open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `O_RDONLY`.
    ReadOnly,
    /// `O_WRONLY`.
    WriteOnly,
    /// `O_RDWR`.
    ReadWrite,
}

impl AccessMode {
    /// Decode the access mode bits of open(2) flags.
    ///
    /// # Arguments
    /// * `flags` - Raw open flags
    pub fn from_flags(flags: i32) -> Self {
        match flags & libc::O_ACCMODE {
            libc::O_RDONLY => AccessMode::ReadOnly,
            libc::O_WRONLY => AccessMode::WriteOnly,
            _ => AccessMode::ReadWrite,
        }
    }

    /// Check if the mode carries no write intent.
    pub fn is_read_only(self) -> bool {
        self == AccessMode::ReadOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_from_flags() {
        assert_eq!(AccessMode::from_flags(libc::O_RDONLY), AccessMode::ReadOnly);
        assert_eq!(AccessMode::from_flags(libc::O_WRONLY), AccessMode::WriteOnly);
        assert_eq!(AccessMode::from_flags(libc::O_RDWR), AccessMode::ReadWrite);
        // Non-access bits are ignored.
        assert_eq!(
            AccessMode::from_flags(libc::O_RDONLY | libc::O_NONBLOCK),
            AccessMode::ReadOnly
        );
        assert_eq!(
            AccessMode::from_flags(libc::O_WRONLY | libc::O_APPEND),
            AccessMode::WriteOnly
        );
    }

    #[test]
    fn test_is_read_only() {
        assert!(AccessMode::ReadOnly.is_read_only());
        assert!(!AccessMode::WriteOnly.is_read_only());
        assert!(!AccessMode::ReadWrite.is_read_only());
    }
}
