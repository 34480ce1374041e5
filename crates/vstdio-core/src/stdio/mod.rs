//! Virtual stdio: named in-memory streams, cursor-bearing handles over them,
//! and the printf-family renderer.
//!
//! Bytes only ever live in a [`ByteBuffer`] owned by the [`StreamStore`]
//! (or, for console streams, by a single unnamed handle). Handles hold a
//! shared reference plus their own cursor.

pub mod buffer;
pub mod file;
pub mod printf;
pub mod seek;
pub mod store;

pub use buffer::{ByteBuffer, SharedBuffer};
pub use file::{Access, OpenKind, OpenMode, StreamHandle, parse_mode};
pub use printf::{BufferFormat, FormatArg, format_to_buffer, render, render_into};
pub use seek::{SEEK_CUR, SEEK_END, SEEK_SET, Whence, resolve, resolve_within};
pub use store::StreamStore;
