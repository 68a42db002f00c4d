//! Shared types and utilities for dxfs.
//!
//! This crate provides functionality used across the dxfs crates:
//! - Reserved inode numbers and default durations
//! - Mount owner identity (uid/gid of the mounting user)
//! - Byte range arithmetic for HTTP range reads
//! - Shared error types

pub mod constants;
pub mod error;
pub mod owner;
pub mod range;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::RangeError;
pub use owner::{current_owner, Owner};
pub use range::ByteRange;
