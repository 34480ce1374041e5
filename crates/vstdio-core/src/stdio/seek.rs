//! Seek resolution.
//!
//! A pure function from `(origin, offset, cursor, length)` to a new cursor.
//! Candidate = `{0, cursor, length}[origin] + offset`, accepted iff
//! `0 <= candidate <= length`. Nothing here ever moves a cursor past the
//! current content; only a write may grow a buffer. The one exception is
//! [`SparseWrite`](crate::SeekPolicy::SparseWrite) for writable handles, whose upper bound comes
//! from [`StoreConfig::seek_limit`](crate::StoreConfig::seek_limit).

use core::fmt;

use crate::error::{Result, StdioError};

/// POSIX `SEEK_SET`.
pub const SEEK_SET: i32 = 0;
/// POSIX `SEEK_CUR`.
pub const SEEK_CUR: i32 = 1;
/// POSIX `SEEK_END`.
pub const SEEK_END: i32 = 2;

/// Reference point of a seek offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Whence {
    Start,
    Current,
    End,
}

impl Whence {
    /// Convert from a POSIX `whence` constant.
    #[must_use]
    pub fn from_posix(whence: i32) -> Option<Self> {
        match whence {
            SEEK_SET => Some(Self::Start),
            SEEK_CUR => Some(Self::Current),
            SEEK_END => Some(Self::End),
            _ => None,
        }
    }
}

impl fmt::Display for Whence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Current => "current",
            Self::End => "end",
        })
    }
}

/// Resolve a seek under the bounded-cursor policy.
pub fn resolve(origin: Whence, offset: i64, cursor: usize, length: usize) -> Result<usize> {
    resolve_within(origin, offset, cursor, length, length)
}

/// Resolve a seek whose target may lie anywhere in `[0, upper]`.
///
/// `upper` is normally `length`; it exceeds it only for sparse writers.
pub fn resolve_within(
    origin: Whence,
    offset: i64,
    cursor: usize,
    length: usize,
    upper: usize,
) -> Result<usize> {
    let base = match origin {
        Whence::Start => 0,
        Whence::Current => cursor,
        Whence::End => length,
    };
    // i128 holds any usize + i64 without overflow.
    let candidate = base as i128 + i128::from(offset);

    if (0..=upper as i128).contains(&candidate) {
        Ok(candidate as usize)
    } else {
        Err(StdioError::OutOfBounds {
            origin,
            offset,
            length,
        })
    }
}
