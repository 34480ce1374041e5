//! Open modes and stream handles.
//!
//! `StreamHandle` is the safe model of a C `FILE`: a shared reference to one
//! [`ByteBuffer`], a cursor, an access mode and an open flag. It owns no data.
//!
//! Invariant while open (bounded policy): `0 <= cursor <= buffer.len()`.
//! Another handle may reset the shared buffer (truncating open); the stale
//! handle notices the generation change and clamps its cursor to the length
//! the buffer had right after the reset before its next operation.
//!
//! That clamp is tighter than clamping to the buffer's current length: if
//! the buffer was truncated and then regrown before the stale handle moves
//! again, the handle resumes at the post-reset length (0 for a truncating
//! open), never inside bytes written after the reset it did not observe.

use core::fmt;
use std::io;
use std::sync::Arc;

use super::buffer::{ByteBuffer, SharedBuffer, shared};
use super::printf::{self, FormatArg};
use super::seek::{Whence, resolve_within};
use crate::config::{SeekPolicy, StoreConfig};
use crate::error::{Direction, Result, StdioError};

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// What opening a name does to its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenKind {
    /// Buffer must exist; cursor 0.
    Read,
    /// Buffer created or reset to empty; cursor 0.
    WriteTruncate,
    /// Buffer created or kept; cursor at its current length.
    WriteAppend,
}

/// Transfer directions a handle permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    #[must_use]
    pub const fn readable(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    #[must_use]
    pub const fn writable(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read-only",
            Self::Write => "write-only",
            Self::ReadWrite => "read-write",
        })
    }
}

/// Parsed open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenMode {
    pub kind: OpenKind,
    /// `+` in a mode string: both directions allowed.
    pub update: bool,
}

impl OpenMode {
    pub const READ: Self = Self::new(OpenKind::Read);
    pub const WRITE_TRUNCATE: Self = Self::new(OpenKind::WriteTruncate);
    pub const WRITE_APPEND: Self = Self::new(OpenKind::WriteAppend);

    #[must_use]
    pub const fn new(kind: OpenKind) -> Self {
        Self {
            kind,
            update: false,
        }
    }

    #[must_use]
    pub const fn with_update(mut self) -> Self {
        self.update = true;
        self
    }

    #[must_use]
    pub const fn access(self) -> Access {
        match (self.kind, self.update) {
            (_, true) => Access::ReadWrite,
            (OpenKind::Read, false) => Access::Read,
            (OpenKind::WriteTruncate | OpenKind::WriteAppend, false) => Access::Write,
        }
    }
}

/// Parse a classic fopen mode string (`"r"`, `"w+"`, `"ab"`, `"rb+"`).
///
/// `b` is accepted and ignored; streams are always binary.
pub fn parse_mode(mode: &str) -> Result<OpenMode> {
    let invalid = || StdioError::InvalidMode {
        mode: mode.to_string(),
    };
    let bytes = mode.as_bytes();
    let Some((&first, rest)) = bytes.split_first() else {
        return Err(invalid());
    };

    let mut parsed = match first {
        b'r' => OpenMode::READ,
        b'w' => OpenMode::WRITE_TRUNCATE,
        b'a' => OpenMode::WRITE_APPEND,
        _ => return Err(invalid()),
    };

    let mut seen_b = false;
    for &m in rest {
        match m {
            b'+' if !parsed.update => parsed.update = true,
            b'b' if !seen_b => seen_b = true,
            _ => return Err(invalid()),
        }
    }
    Ok(parsed)
}

impl std::str::FromStr for OpenMode {
    type Err = StdioError;

    fn from_str(s: &str) -> Result<Self> {
        parse_mode(s)
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// An open, cursor-bearing reference to a buffer.
#[derive(Debug)]
pub struct StreamHandle {
    name: Option<Arc<str>>,
    buffer: SharedBuffer,
    cursor: usize,
    access: Access,
    open: bool,
    /// Buffer generation this cursor was last validated against.
    generation: u64,
    config: StoreConfig,
}

impl StreamHandle {
    pub(crate) fn attach(
        name: Option<Arc<str>>,
        buffer: SharedBuffer,
        cursor: usize,
        access: Access,
        config: StoreConfig,
    ) -> Self {
        let generation = buffer.lock().generation();
        Self {
            name,
            buffer,
            cursor,
            access,
            open: true,
            generation,
            config,
        }
    }

    /// Handle over a private buffer not registered in any store.
    ///
    /// Used for console streams: the handle is the buffer's only owner.
    #[must_use]
    pub fn unnamed(access: Access, config: StoreConfig) -> Self {
        Self::attach(None, shared(ByteBuffer::new()), 0, access, config)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Store name, or `None` for unnamed streams.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn access(&self) -> Access {
        self.access
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn seek_policy(&self) -> SeekPolicy {
        self.config.seek_policy
    }

    /// Current cursor.
    pub fn tell(&self) -> Result<usize> {
        self.ensure_open()?;
        let buf = self.buffer.lock();
        Ok(current_cursor(self.cursor, self.generation, &buf))
    }

    /// Current length of the underlying buffer.
    pub fn len(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.buffer.lock().len())
    }

    /// True if the underlying buffer is empty.
    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    // -----------------------------------------------------------------------
    // Transfer
    // -----------------------------------------------------------------------

    /// Copy up to `dst.len()` bytes from the cursor, advancing it.
    ///
    /// Returns the number copied; fewer than requested means end-of-stream.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.check(Direction::Read)?;
        let buf = self.buffer.lock();
        revalidate(&mut self.cursor, &mut self.generation, &buf);
        let n = buf.read_at(self.cursor, dst);
        self.cursor += n;
        Ok(n)
    }

    /// Read up to `count` bytes into a fresh vector.
    pub fn read_to_vec(&mut self, count: usize) -> Result<Vec<u8>> {
        self.check(Direction::Read)?;
        let mut out = vec![0u8; count.min(self.remaining())];
        let n = self.read(&mut out)?;
        out.truncate(n);
        Ok(out)
    }

    /// Write `src` at the cursor, overwriting in place and growing the
    /// buffer for whatever extends past its end. The cursor advances by
    /// the number of bytes stored, which is `src.len()` unless the store
    /// caps stream length.
    pub fn write(&mut self, src: &[u8]) -> Result<usize> {
        self.check(Direction::Write)?;
        let mut buf = self.buffer.lock();
        revalidate(&mut self.cursor, &mut self.generation, &buf);
        let n = buf.write_at(self.cursor, src, self.config.max_stream_len);
        self.cursor += n;
        Ok(n)
    }

    /// Move the cursor. On failure the cursor is unchanged.
    pub fn seek(&mut self, origin: Whence, offset: i64) -> Result<usize> {
        self.ensure_open()?;
        let buf = self.buffer.lock();
        revalidate(&mut self.cursor, &mut self.generation, &buf);
        let upper = self.config.seek_limit(buf.len(), self.access.writable());
        self.cursor = resolve_within(origin, offset, self.cursor, buf.len(), upper)?;
        Ok(self.cursor)
    }

    /// Seek to the start.
    pub fn rewind(&mut self) -> Result<()> {
        self.seek(Whence::Start, 0).map(|_| ())
    }

    /// Streams are unbuffered; succeeds on any open handle.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()
    }

    /// Render `template` with `args` and write the bytes at the cursor.
    ///
    /// Returns the number of bytes written.
    pub fn print(&mut self, template: &[u8], args: &[FormatArg<'_>]) -> Result<usize> {
        self.check(Direction::Write)?;
        let rendered = printf::render(template, args)?;
        self.write(&rendered)
    }

    /// Close the handle. Closing twice reports `Closed`.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.open = false;
        Ok(())
    }

    /// Drain the whole buffer, leaving it empty with the cursor at 0.
    pub(crate) fn take_contents(&mut self) -> Vec<u8> {
        let mut buf = self.buffer.lock();
        let data = buf.take();
        self.generation = buf.generation();
        self.cursor = 0;
        data
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(StdioError::Closed)
        }
    }

    fn check(&self, op: Direction) -> Result<()> {
        self.ensure_open()?;
        let permitted = match op {
            Direction::Read => self.access.readable(),
            Direction::Write => self.access.writable(),
        };
        if permitted {
            Ok(())
        } else {
            Err(StdioError::ModeViolation {
                access: self.access,
                op,
            })
        }
    }

    fn remaining(&self) -> usize {
        let buf = self.buffer.lock();
        buf.len()
            .saturating_sub(current_cursor(self.cursor, self.generation, &buf))
    }
}

/// Cursor as seen against the buffer's current generation.
fn current_cursor(cursor: usize, generation: u64, buf: &ByteBuffer) -> usize {
    if generation == buf.generation() {
        cursor
    } else {
        cursor.min(buf.epoch_len())
    }
}

/// Clamp a cursor left stale by a reset of the shared buffer.
fn revalidate(cursor: &mut usize, generation: &mut u64, buf: &ByteBuffer) {
    *cursor = current_cursor(*cursor, *generation, buf);
    *generation = buf.generation();
}

// ---------------------------------------------------------------------------
// std::io adapters
// ---------------------------------------------------------------------------

impl io::Read for StreamHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(StreamHandle::read(self, buf)?)
    }
}

impl io::Write for StreamHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(StreamHandle::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(StreamHandle::flush(self)?)
    }
}

impl io::Seek for StreamHandle {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (origin, offset) = match pos {
            io::SeekFrom::Start(n) => {
                let n = i64::try_from(n).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek offset exceeds i64")
                })?;
                (Whence::Start, n)
            }
            io::SeekFrom::Current(n) => (Whence::Current, n),
            io::SeekFrom::End(n) => (Whence::End, n),
        };
        let cursor = StreamHandle::seek(self, origin, offset)?;
        Ok(cursor as u64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_over(content: &[u8], access: Access) -> StreamHandle {
        StreamHandle::attach(
            Some(Arc::from("t")),
            shared(ByteBuffer::from(content)),
            0,
            access,
            StoreConfig::default(),
        )
    }

    #[test]
    fn test_parse_mode_basic() {
        assert_eq!(parse_mode("r").unwrap(), OpenMode::READ);
        assert_eq!(parse_mode("w").unwrap(), OpenMode::WRITE_TRUNCATE);
        assert_eq!(parse_mode("a").unwrap(), OpenMode::WRITE_APPEND);
    }

    #[test]
    fn test_parse_mode_update_and_binary() {
        let m = parse_mode("rb+").unwrap();
        assert_eq!(m.kind, OpenKind::Read);
        assert_eq!(m.access(), Access::ReadWrite);
        let m: OpenMode = "w+b".parse().unwrap();
        assert_eq!(m.kind, OpenKind::WriteTruncate);
        assert!(m.update);
        assert_eq!(parse_mode("ab").unwrap().access(), Access::Write);
    }

    #[test]
    fn test_parse_mode_invalid() {
        for bad in ["", "z", "rw", "r++", "wbb", "x", "r x"] {
            let err = parse_mode(bad).unwrap_err();
            assert_eq!(err.kind_name(), "InvalidMode", "{bad:?}");
        }
    }

    #[test]
    fn test_read_advances_and_short_reads() {
        let mut h = handle_over(b"abcdef", Access::Read);
        let mut dst = [0u8; 4];
        assert_eq!(h.read(&mut dst).unwrap(), 4);
        assert_eq!(&dst, b"abcd");
        assert_eq!(h.read(&mut dst).unwrap(), 2);
        assert_eq!(&dst[..2], b"ef");
        assert_eq!(h.read(&mut dst).unwrap(), 0);
        assert_eq!(h.tell().unwrap(), 6);
    }

    #[test]
    fn test_read_to_vec_caps_at_remaining() {
        let mut h = handle_over(b"abc", Access::Read);
        assert_eq!(h.read_to_vec(100).unwrap(), b"abc");
        assert!(h.read_to_vec(5).unwrap().is_empty());
    }

    #[test]
    fn test_mode_violations() {
        let mut r = handle_over(b"abc", Access::Read);
        assert_eq!(
            r.write(b"x").unwrap_err(),
            StdioError::ModeViolation {
                access: Access::Read,
                op: Direction::Write
            }
        );
        let mut w = handle_over(b"abc", Access::Write);
        let mut dst = [0u8; 1];
        assert_eq!(w.read(&mut dst).unwrap_err().kind_name(), "ModeViolation");
        assert_eq!(w.print(b"x", &[]).unwrap(), 1);
    }

    #[test]
    fn test_closed_handle_rejects_everything() {
        let mut h = handle_over(b"abc", Access::ReadWrite);
        h.close().unwrap();
        assert!(!h.is_open());
        assert_eq!(h.close(), Err(StdioError::Closed));
        assert_eq!(h.tell(), Err(StdioError::Closed));
        assert_eq!(h.write(b"x"), Err(StdioError::Closed));
        assert_eq!(h.seek(Whence::Start, 0), Err(StdioError::Closed));
        assert_eq!(h.flush(), Err(StdioError::Closed));
        let mut dst = [0u8; 1];
        assert_eq!(h.read(&mut dst), Err(StdioError::Closed));
    }

    #[test]
    fn test_failed_seek_keeps_cursor() {
        let mut h = handle_over(b"0123456789", Access::ReadWrite);
        h.seek(Whence::Start, 3).unwrap();
        assert!(h.seek(Whence::Current, 8).is_err());
        assert_eq!(h.tell().unwrap(), 3);
    }

    #[test]
    fn test_stale_cursor_clamped_after_reset() {
        let buffer = shared(ByteBuffer::from(b"0123456789".as_slice()));
        let cfg = StoreConfig::default();
        let mut a = StreamHandle::attach(None, Arc::clone(&buffer), 0, Access::ReadWrite, cfg);
        a.seek(Whence::End, 0).unwrap();
        assert_eq!(a.tell().unwrap(), 10);

        buffer.lock().reset();
        buffer.lock().write_at(0, b"abc", None);
        // Clamped to the post-reset length, not the grown one.
        assert_eq!(a.tell().unwrap(), 0);
        buffer.lock().reset();

        let mut dst = [0u8; 4];
        assert_eq!(a.read(&mut dst).unwrap(), 0);
        a.write(b"xy").unwrap();
        assert_eq!(buffer.lock().as_slice(), b"xy");
        assert_eq!(a.tell().unwrap(), 2);
    }

    #[test]
    fn test_sparse_seek_then_write_zero_fills() {
        let cfg = StoreConfig::default().with_seek_policy(SeekPolicy::SparseWrite);
        let buffer = shared(ByteBuffer::from(b"ab".as_slice()));
        let mut h = StreamHandle::attach(None, Arc::clone(&buffer), 0, Access::ReadWrite, cfg);
        assert_eq!(h.seek(Whence::End, 3).unwrap(), 5);
        let mut dst = [0u8; 2];
        assert_eq!(h.read(&mut dst).unwrap(), 0);
        h.write(b"Z").unwrap();
        assert_eq!(buffer.lock().as_slice(), b"ab\0\0\0Z");
    }

    #[test]
    fn test_sparse_seek_is_bounded() {
        let cfg = StoreConfig::default().with_seek_policy(SeekPolicy::SparseWrite);
        let buffer = shared(ByteBuffer::from(b"ab".as_slice()));
        let mut h = StreamHandle::attach(None, Arc::clone(&buffer), 0, Access::Write, cfg);
        let err = h.seek(Whence::End, i64::MAX).unwrap_err();
        assert_eq!(err.kind_name(), "OutOfBounds");
        assert_eq!(h.tell().unwrap(), 0);

        assert_eq!(h.write(b"x").unwrap(), 1);
        assert_eq!(buffer.lock().as_slice(), b"xb");

        let gap = crate::config::MAX_SPARSE_GAP as i64;
        assert!(h.seek(Whence::End, gap + 1).is_err());
        assert_eq!(h.seek(Whence::End, gap).unwrap(), 2 + gap as usize);
    }

    #[test]
    fn test_sparse_seek_respects_stream_cap() {
        let cfg = StoreConfig::default()
            .with_seek_policy(SeekPolicy::SparseWrite)
            .with_max_stream_len(8);
        let mut h = StreamHandle::unnamed(Access::ReadWrite, cfg);
        h.write(b"abc").unwrap();
        assert!(h.seek(Whence::Start, 9).is_err());
        assert_eq!(h.seek(Whence::Start, 6).unwrap(), 6);
        assert_eq!(h.write(b"XYZ").unwrap(), 2);
        assert_eq!(h.len().unwrap(), 8);
    }

    #[test]
    fn test_max_stream_len_short_write() {
        let cfg = StoreConfig::default().with_max_stream_len(4);
        let mut h = StreamHandle::unnamed(Access::ReadWrite, cfg);
        assert_eq!(h.write(b"abcdef").unwrap(), 4);
        assert_eq!(h.tell().unwrap(), 4);
        assert_eq!(h.write(b"g").unwrap(), 0);
    }

    #[test]
    fn test_take_contents_resets() {
        let mut h = StreamHandle::unnamed(Access::Write, StoreConfig::default());
        h.write(b"hello").unwrap();
        assert_eq!(h.take_contents(), b"hello");
        assert_eq!(h.tell().unwrap(), 0);
        h.write(b"x").unwrap();
        assert_eq!(h.take_contents(), b"x");
    }

    #[test]
    fn test_io_traits() {
        use std::io::{Read, Seek, SeekFrom, Write};

        let mut h = StreamHandle::unnamed(Access::ReadWrite, StoreConfig::default());
        h.write_all(b"hello world").unwrap();
        assert_eq!(Seek::seek(&mut h, SeekFrom::Start(6)).unwrap(), 6);
        let mut s = String::new();
        h.read_to_string(&mut s).unwrap();
        assert_eq!(s, "world");
        let err = Seek::seek(&mut h, SeekFrom::End(1)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
