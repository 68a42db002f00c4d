//! Configuration options for the VFS.
//!
//! This module provides configuration for kernel caching, readahead, mount
//! flags and access-locator negotiation. Everything is fixed at mount time.

use std::time::Duration;

use dxfs_common::{DEFAULT_LOCATOR_DURATION_SECS, DEFAULT_MAX_READAHEAD, DIRECTORY_ATTR_TTL};

/// Configuration options for the VFS.
///
/// # Example
///
/// ```ignore
/// let options = VfsOptions::default()
///     .with_read_ahead(ReadAheadOptions::default().with_max_readahead(4 * 1024 * 1024))
///     .with_kernel_cache(KernelCacheOptions::immutable());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VfsOptions {
    /// Kernel cache settings.
    pub kernel_cache: KernelCacheOptions,
    /// Read-ahead hints advertised to the kernel.
    pub read_ahead: ReadAheadOptions,
    /// Mount flags.
    pub mount: MountOptions,
    /// Access-locator negotiation.
    pub locator: LocatorOptions,
}

impl VfsOptions {
    /// Set kernel cache options.
    ///
    /// # Arguments
    /// * `kernel_cache` - Kernel cache configuration
    pub fn with_kernel_cache(mut self, kernel_cache: KernelCacheOptions) -> Self {
        self.kernel_cache = kernel_cache;
        self
    }

    /// Set read-ahead options.
    ///
    /// # Arguments
    /// * `read_ahead` - Read-ahead configuration
    pub fn with_read_ahead(mut self, read_ahead: ReadAheadOptions) -> Self {
        self.read_ahead = read_ahead;
        self
    }

    /// Set mount options.
    ///
    /// # Arguments
    /// * `mount` - Mount configuration
    pub fn with_mount(mut self, mount: MountOptions) -> Self {
        self.mount = mount;
        self
    }

    /// Set locator options.
    ///
    /// # Arguments
    /// * `locator` - Locator configuration
    pub fn with_locator(mut self, locator: LocatorOptions) -> Self {
        self.locator = locator;
        self
    }
}

// ============================================================================
// Kernel Cache Options
// ============================================================================

/// Options for kernel-level caching (FUSE).
///
/// Controls how the kernel caches file data and attributes.
#[derive(Debug, Clone)]
pub struct KernelCacheOptions {
    /// Keep the kernel page cache across opens.
    /// Objects are immutable, so cached pages never go stale.
    pub enable_page_cache: bool,

    /// File attribute cache timeout in seconds.
    pub attr_timeout_secs: u64,

    /// Entry cache timeout in seconds.
    /// How long the kernel caches name lookups.
    pub entry_timeout_secs: u64,

    /// Attribute cache timeout for the root directory.
    pub dir_attr_timeout: Duration,
}

impl Default for KernelCacheOptions {
    fn default() -> Self {
        Self {
            enable_page_cache: true,
            attr_timeout_secs: 86400,  // 24 hours (immutable content)
            entry_timeout_secs: 86400, // 24 hours
            dir_attr_timeout: DIRECTORY_ATTR_TTL,
        }
    }
}

impl KernelCacheOptions {
    /// Create options optimized for immutable content (long cache times).
    pub fn immutable() -> Self {
        Self {
            enable_page_cache: true,
            attr_timeout_secs: 86400 * 7, // 1 week
            entry_timeout_secs: 86400 * 7,
            dir_attr_timeout: DIRECTORY_ATTR_TTL,
        }
    }

    /// Create options with no kernel caching.
    pub fn no_cache() -> Self {
        Self {
            enable_page_cache: false,
            attr_timeout_secs: 0,
            entry_timeout_secs: 0,
            dir_attr_timeout: Duration::ZERO,
        }
    }

    /// File attribute TTL.
    pub fn attr_ttl(&self) -> Duration {
        Duration::from_secs(self.attr_timeout_secs)
    }

    /// Entry TTL.
    pub fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.entry_timeout_secs)
    }
}

// ============================================================================
// Read-Ahead Options
// ============================================================================

/// Read-ahead hints advertised to the kernel at init.
///
/// The filesystem itself never reads ahead; these only let the kernel batch
/// reads into fewer, larger requests.
#[derive(Debug, Clone)]
pub struct ReadAheadOptions {
    /// Maximum readahead in bytes.
    pub max_readahead: u32,

    /// Let the kernel issue multiple reads on one handle concurrently.
    pub async_read: bool,
}

impl Default for ReadAheadOptions {
    fn default() -> Self {
        Self {
            max_readahead: DEFAULT_MAX_READAHEAD,
            async_read: true,
        }
    }
}

impl ReadAheadOptions {
    /// Set the maximum readahead.
    ///
    /// # Arguments
    /// * `max_readahead` - Bytes
    pub fn with_max_readahead(mut self, max_readahead: u32) -> Self {
        self.max_readahead = max_readahead;
        self
    }

    /// Create options with no read-ahead and synchronous reads.
    pub fn disabled() -> Self {
        Self {
            max_readahead: 0,
            async_read: false,
        }
    }
}

// ============================================================================
// Mount Options
// ============================================================================

/// Flags passed to the mount call. The mount is always read-only.
#[derive(Debug, Clone)]
pub struct MountOptions {
    /// Filesystem name shown in the mount table.
    pub fs_name: String,
    /// Allow users other than the mounting user to access the mount.
    /// Requires `user_allow_other` in `/etc/fuse.conf`.
    pub allow_other: bool,
    /// Unmount automatically when the process exits.
    pub auto_unmount: bool,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            fs_name: "dxfs".into(),
            allow_other: true,
            auto_unmount: true,
        }
    }
}

// ============================================================================
// Locator Options
// ============================================================================

/// Options for access-locator negotiation on open.
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Validity requested for each locator, in seconds.
    pub duration_secs: u64,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_LOCATOR_DURATION_SECS,
        }
    }
}

impl LocatorOptions {
    /// Requested validity as a `Duration`.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
