//! Shared constants used across dxfs crates.

use std::time::Duration;

/// Inode of the mount root (FUSE convention).
pub const ROOT_INODE: u64 = 1;

/// First inode handed out to catalog files.
/// Everything below is reserved for the root and other fixed entries.
pub const BASE_FILE_INODE: u64 = 10;

/// Seconds in a (non-leap) year.
pub const SECONDS_PER_YEAR: u64 = 60 * 60 * 24 * 365;

/// Validity requested for every access locator (one year).
pub const DEFAULT_LOCATOR_DURATION_SECS: u64 = SECONDS_PER_YEAR;

/// Attribute validity for the root directory. Membership never changes
/// during a mount, so the kernel may keep it for a year.
pub const DIRECTORY_ATTR_TTL: Duration = Duration::from_secs(SECONDS_PER_YEAR);

/// Largest readahead advertised to the kernel (1MB).
pub const DEFAULT_MAX_READAHEAD: u32 = 1024 * 1024;

/// Nominal size reported for the root directory.
pub const DIRECTORY_SIZE: u64 = 4096;

/// Block size reported for the root directory.
pub const DIRECTORY_BLOCK_SIZE: u32 = 4096;

/// Unit used when converting byte sizes to `st_blocks`.
pub const STAT_BLOCK_SIZE: u64 = 512;
