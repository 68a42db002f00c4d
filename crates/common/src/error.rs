//! Shared error types used across dxfs crates.

use thiserror::Error;

/// Errors raised while translating a read request into a byte range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// The request does not fit in a 64-bit offset.
    #[error("Range overflow: offset {offset} + length {length} exceeds u64")]
    Overflow {
        /// Requested start offset.
        offset: u64,
        /// Requested length.
        length: u64,
    },
}
