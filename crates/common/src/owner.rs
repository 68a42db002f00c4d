//! Identity of the user that owns the mount.

/// Numeric owner reported for every node in the mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    /// User ID.
    pub uid: u32,
    /// Group ID.
    pub gid: u32,
}

impl Owner {
    /// Create an owner from explicit IDs.
    ///
    /// # Arguments
    /// * `uid` - User ID
    /// * `gid` - Group ID
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }
}

/// Get the uid/gid of the current process.
///
/// # Platform Behavior
/// - Unix: real user and group IDs from `getuid`/`getgid`
/// - Other: root (0/0)
pub fn current_owner() -> Owner {
    current_owner_impl()
}

#[cfg(unix)]
fn current_owner_impl() -> Owner {
    // SAFETY: getuid/getgid have no preconditions and cannot fail.
    let uid: u32 = unsafe { libc::getuid() };
    let gid: u32 = unsafe { libc::getgid() };
    Owner { uid, gid }
}

#[cfg(not(unix))]
fn current_owner_impl() -> Owner {
    Owner { uid: 0, gid: 0 }
}
