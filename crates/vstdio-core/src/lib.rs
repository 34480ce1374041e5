//! # vstdio-core
//!
//! Deterministic emulation of the classic `<stdio.h>` surface for programs
//! running on a host with no filesystem and no console.
//!
//! - [`stdio::StreamStore`]: named in-memory byte buffers and open handles.
//! - [`stdio::StreamHandle`]: cursor-bearing view of one buffer with a
//!   bounded-cursor seek policy.
//! - [`stdio::printf`]: template renderer driven by typed arguments.
//! - [`Stdio`]: a single context value owning the store plus the console
//!   streams, for engines that want `printf`/`puts` without globals.
//!
//! No `unsafe` code is permitted at the crate level.

#![deny(unsafe_code)]

pub mod config;
pub mod context;
pub mod error;
pub mod log;
pub mod stdio;

pub use config::{SeekPolicy, StoreConfig};
pub use context::Stdio;
pub use error::{DirectiveFault, Direction, Result, StdioError};
pub use stdio::{
    Access, BufferFormat, ByteBuffer, FormatArg, OpenKind, OpenMode, StreamHandle, StreamStore,
    Whence,
};
