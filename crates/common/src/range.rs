//! Byte range arithmetic for HTTP range reads.
//!
//! File reads arrive as `(offset, length)`; HTTP wants an inclusive
//! `bytes=<start>-<end>` pair. An empty request has no inclusive form, so
//! constructors return `None` for it and callers skip the fetch.

use std::fmt;

use crate::error::RangeError;

/// An inclusive, non-empty byte range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte (inclusive).
    pub start: u64,
    /// Last byte (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Range covering `[offset, offset + length)`.
    ///
    /// # Arguments
    /// * `offset` - Absolute start offset
    /// * `length` - Number of bytes requested
    ///
    /// # Returns
    /// `None` when `length` is zero.
    ///
    /// # Errors
    /// Returns `RangeError::Overflow` if the end does not fit in a u64.
    pub fn new(offset: u64, length: u64) -> Result<Option<Self>, RangeError> {
        if length == 0 {
            return Ok(None);
        }
        let end_exclusive: u64 = offset
            .checked_add(length)
            .ok_or(RangeError::Overflow { offset, length })?;
        Ok(Some(Self {
            start: offset,
            end: end_exclusive - 1,
        }))
    }

    /// Range covering `[offset, offset + length)`, clipped to an object of
    /// `object_size` bytes.
    ///
    /// # Arguments
    /// * `offset` - Absolute start offset
    /// * `length` - Number of bytes requested
    /// * `object_size` - Total size of the object
    ///
    /// # Returns
    /// `None` when nothing of the request lies inside the object.
    pub fn clamped(
        offset: u64,
        length: u64,
        object_size: u64,
    ) -> Result<Option<Self>, RangeError> {
        if offset >= object_size {
            return Ok(None);
        }
        let range: Option<ByteRange> = Self::new(offset, length)?;
        Ok(range.map(|r| Self {
            start: r.start,
            end: r.end.min(object_size - 1),
        }))
    }

    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for the HTTP `Range` header.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes={}-{}", self.start, self.end)
    }
}
