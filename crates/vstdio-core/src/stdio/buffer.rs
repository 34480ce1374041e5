//! Growable byte buffer backing one virtual stream.
//!
//! Invariants:
//! - `len() == as_slice().len()`; spare `Vec` capacity is never readable.
//! - `generation` increases every time the content is discarded wholesale
//!   (truncating open or re-install), so handles can detect a stale cursor.
//! - `len() >= epoch_len()`: nothing but a discard ever shrinks content.

use std::sync::Arc;

use parking_lot::Mutex;

/// Buffer shared between the store entry and every handle opened on it.
pub type SharedBuffer = Arc<Mutex<ByteBuffer>>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    generation: u64,
    epoch_len: usize,
}

impl ByteBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Truncation epoch.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Length right after the most recent discard. A cursor from an older
    /// generation is clamped to this.
    #[must_use]
    pub fn epoch_len(&self) -> usize {
        self.epoch_len
    }

    /// Discard all content and start a new generation.
    pub fn reset(&mut self) {
        self.data.clear();
        self.new_epoch();
    }

    /// Replace all content and start a new generation.
    pub fn replace(&mut self, content: Vec<u8>) {
        self.data = content;
        self.new_epoch();
    }

    /// Move the content out, leaving the buffer empty in a new generation.
    pub fn take(&mut self) -> Vec<u8> {
        let data = std::mem::take(&mut self.data);
        self.new_epoch();
        data
    }

    fn new_epoch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.epoch_len = self.data.len();
    }

    /// Copy bytes starting at `pos` into `dst`.
    ///
    /// Returns the number copied: `min(dst.len(), len - pos)`, or 0 when
    /// `pos` is at or past the end.
    pub fn read_at(&self, pos: usize, dst: &mut [u8]) -> usize {
        let Some(available) = self.data.get(pos..) else {
            return 0;
        };
        let n = dst.len().min(available.len());
        dst[..n].copy_from_slice(&available[..n]);
        n
    }

    /// Write `src` at `pos`, overwriting the overlap and appending the rest.
    ///
    /// If `pos` is past the end the gap is zero-filled first. `limit` caps
    /// the resulting length; bytes that would land past it are dropped.
    /// Growth that cannot be allocated stores nothing.
    /// Returns the number of bytes of `src` actually stored.
    pub fn write_at(&mut self, pos: usize, src: &[u8], limit: Option<usize>) -> usize {
        let cap = limit.unwrap_or(usize::MAX);
        if pos >= cap {
            return 0;
        }
        let n = src.len().min(cap - pos);
        if n == 0 {
            return 0;
        }
        let end = pos + n;
        let grow = end.saturating_sub(self.data.len());
        if self.data.try_reserve(grow).is_err() {
            return 0;
        }
        if pos > self.data.len() {
            self.data.resize(pos, 0);
        }
        let overlap_end = end.min(self.data.len());
        let overlap = overlap_end - pos;
        self.data[pos..overlap_end].copy_from_slice(&src[..overlap]);
        self.data.extend_from_slice(&src[overlap..n]);
        n
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        let epoch_len = data.len();
        Self {
            data,
            generation: 0,
            epoch_len,
        }
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from(data.to_vec())
    }
}

pub(crate) fn shared(buffer: ByteBuffer) -> SharedBuffer {
    Arc::new(Mutex::new(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_appends_on_empty() {
        let mut b = ByteBuffer::new();
        assert_eq!(b.write_at(0, b"hello", None), 5);
        assert_eq!(b.as_slice(), b"hello");
        assert_eq!(b.len(), 5);
    }

    #[test]
    fn test_write_overwrites_then_grows() {
        let mut b = ByteBuffer::from(b"0123456789".as_slice());
        assert_eq!(b.write_at(8, b"ABCD", None), 4);
        assert_eq!(b.as_slice(), b"01234567ABCD");
    }

    #[test]
    fn test_write_inside_keeps_length() {
        let mut b = ByteBuffer::from(b"0123456789".as_slice());
        b.write_at(4, b"ABC", None);
        assert_eq!(b.as_slice(), b"0123ABC789");
        assert_eq!(b.len(), 10);
    }

    #[test]
    fn test_write_past_end_zero_fills() {
        let mut b = ByteBuffer::from(b"ab".as_slice());
        b.write_at(4, b"z", None);
        assert_eq!(b.as_slice(), b"ab\0\0z");
    }

    #[test]
    fn test_write_limit_is_short() {
        let mut b = ByteBuffer::from(b"abc".as_slice());
        assert_eq!(b.write_at(2, b"XYZ", Some(4)), 2);
        assert_eq!(b.as_slice(), b"abXY");
        assert_eq!(b.write_at(4, b"Q", Some(4)), 0);
        assert_eq!(b.write_at(9, b"Q", Some(4)), 0);
    }

    #[test]
    fn test_unallocatable_gap_is_empty_write() {
        let mut b = ByteBuffer::from(b"ab".as_slice());
        let pos = isize::MAX as usize + 1;
        assert_eq!(b.write_at(pos, b"z", None), 0);
        assert_eq!(b.as_slice(), b"ab");
    }

    #[test]
    fn test_read_at_bounds() {
        let b = ByteBuffer::from(b"abcdef".as_slice());
        let mut dst = [0u8; 4];
        assert_eq!(b.read_at(4, &mut dst), 2);
        assert_eq!(&dst[..2], b"ef");
        assert_eq!(b.read_at(6, &mut dst), 0);
        assert_eq!(b.read_at(60, &mut dst), 0);
    }

    #[test]
    fn test_reset_bumps_generation() {
        let mut b = ByteBuffer::from(b"abc".as_slice());
        let g = b.generation();
        b.reset();
        assert!(b.is_empty());
        assert_eq!(b.generation(), g + 1);
        assert_eq!(b.epoch_len(), 0);
        b.replace(b"xy".to_vec());
        assert_eq!(b.generation(), g + 2);
        assert_eq!(b.epoch_len(), 2);
        assert_eq!(b.take(), b"xy");
        assert!(b.is_empty());
        assert_eq!(b.generation(), g + 3);
    }
}
