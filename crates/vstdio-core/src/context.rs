//! Single context value for an engine: the stream store, the console
//! streams, and an optional structured logger.
//!
//! The engine constructs one `Stdio` at startup and threads it through every
//! call that needs file or console I/O. Nothing here is global.

use serde_json::json;

use crate::config::StoreConfig;
use crate::error::{Result, StdioError};
use crate::log::{LogEmitter, LogEntry, LogLevel};
use crate::stdio::printf::{self, BufferFormat, FormatArg};
use crate::stdio::{Access, OpenMode, StreamHandle, StreamStore, Whence, parse_mode};

/// Log name of the console output stream.
pub const STDOUT_NAME: &str = "<stdout>";
/// Log name of the console error stream.
pub const STDERR_NAME: &str = "<stderr>";

#[derive(Debug)]
pub struct Stdio {
    store: StreamStore,
    stdout: StreamHandle,
    stderr: StreamHandle,
    log: Option<LogEmitter>,
}

impl Default for Stdio {
    fn default() -> Self {
        Self::new()
    }
}

impl Stdio {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            store: StreamStore::with_config(config),
            stdout: StreamHandle::unnamed(Access::Write, config),
            stderr: StreamHandle::unnamed(Access::Write, config),
            log: None,
        }
    }

    #[must_use]
    pub fn with_logger(mut self, log: LogEmitter) -> Self {
        self.log = Some(log);
        self
    }

    #[must_use]
    pub fn store(&self) -> &StreamStore {
        &self.store
    }

    #[must_use]
    pub fn stdout(&self) -> &StreamHandle {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &StreamHandle {
        &self.stderr
    }

    /// Mutable access to the logger, e.g. to flush it.
    pub fn logger_mut(&mut self) -> Option<&mut LogEmitter> {
        self.log.as_mut()
    }

    /// Detach the logger so it can outlive this context.
    pub fn take_logger(&mut self) -> Option<LogEmitter> {
        self.log.take()
    }

    // -----------------------------------------------------------------------
    // Named streams
    // -----------------------------------------------------------------------

    pub fn open(&mut self, name: &str, mode: OpenMode) -> Result<StreamHandle> {
        let result = self.store.open(name, mode);
        if result.is_ok() {
            let details = json!({ "access": mode.access().to_string() });
            self.debug("open", name, details);
        }
        self.observe("open", Some(name), result)
    }

    pub fn fopen(&mut self, name: &str, mode: &str) -> Result<StreamHandle> {
        match parse_mode(mode) {
            Ok(parsed) => self.open(name, parsed),
            Err(err) => self.observe("open", Some(name), Err(err)),
        }
    }

    pub fn fclose(&mut self, handle: &mut StreamHandle) -> Result<()> {
        let result = handle.close();
        if result.is_ok() {
            let name = handle.name().unwrap_or_default().to_string();
            self.debug("close", &name, serde_json::Value::Null);
        }
        self.observe("close", handle.name(), result)
    }

    pub fn fread(&mut self, handle: &mut StreamHandle, dst: &mut [u8]) -> Result<usize> {
        let result = handle.read(dst);
        self.observe_transfer("read", handle.name(), dst.len(), result)
    }

    pub fn fwrite(&mut self, handle: &mut StreamHandle, src: &[u8]) -> Result<usize> {
        let result = handle.write(src);
        self.observe_transfer("write", handle.name(), src.len(), result)
    }

    pub fn fseek(&mut self, handle: &mut StreamHandle, origin: Whence, offset: i64) -> Result<usize> {
        let result = handle.seek(origin, offset);
        self.observe("seek", handle.name(), result)
    }

    pub fn ftell(&mut self, handle: &StreamHandle) -> Result<usize> {
        let result = handle.tell();
        self.observe("tell", handle.name(), result)
    }

    /// Render and write at the handle's cursor.
    pub fn fprintf(
        &mut self,
        handle: &mut StreamHandle,
        template: &[u8],
        args: &[FormatArg<'_>],
    ) -> Result<usize> {
        let result = handle.print(template, args);
        self.observe("printf", handle.name(), result)
    }

    // -----------------------------------------------------------------------
    // Console
    // -----------------------------------------------------------------------

    pub fn printf(&mut self, template: &[u8], args: &[FormatArg<'_>]) -> Result<usize> {
        let result = self.stdout.print(template, args);
        self.observe("printf", Some(STDOUT_NAME), result)
    }

    pub fn eprintf(&mut self, template: &[u8], args: &[FormatArg<'_>]) -> Result<usize> {
        let result = self.stderr.print(template, args);
        self.observe("printf", Some(STDERR_NAME), result)
    }

    /// Write `line` and a newline to stdout.
    pub fn puts(&mut self, line: &str) -> Result<usize> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        let result = self.stdout.write(&bytes);
        self.observe("puts", Some(STDOUT_NAME), result)
    }

    /// Write one byte to stdout, returning it.
    pub fn putchar(&mut self, c: u8) -> Result<u8> {
        let result = self.stdout.write(&[c]).map(|_| c);
        self.observe("putchar", Some(STDOUT_NAME), result)
    }

    /// Drain everything printed to stdout so far.
    pub fn take_stdout(&mut self) -> Vec<u8> {
        self.stdout.take_contents()
    }

    /// Drain everything printed to stderr so far.
    pub fn take_stderr(&mut self) -> Vec<u8> {
        self.stderr.take_contents()
    }

    // -----------------------------------------------------------------------
    // Fixed buffers
    // -----------------------------------------------------------------------

    /// `snprintf`: see [`printf::format_to_buffer`].
    pub fn snprintf(
        &mut self,
        dst: &mut [u8],
        template: &[u8],
        args: &[FormatArg<'_>],
    ) -> Result<BufferFormat> {
        let result = printf::format_to_buffer(dst, template, args);
        self.observe("snprintf", None, result)
    }

    // -----------------------------------------------------------------------
    // Logging
    // -----------------------------------------------------------------------

    fn debug(&mut self, op: &str, stream: &str, details: serde_json::Value) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        let mut entry = LogEntry::new("", LogLevel::Debug, op)
            .with_op(op)
            .with_stream(stream);
        if !details.is_null() {
            entry = entry.with_details(details);
        }
        // A failing log sink never fails the stream operation.
        let _ = log.emit_entry(entry);
    }

    fn observe<T>(&mut self, op: &str, stream: Option<&str>, result: Result<T>) -> Result<T> {
        if let (Err(err), Some(log)) = (&result, self.log.as_mut()) {
            let _ = log.emit_entry(error_entry(op, stream, err));
        }
        result
    }

    /// Like `observe`, also recording how many bytes the failed call asked for.
    fn observe_transfer(
        &mut self,
        op: &str,
        stream: Option<&str>,
        requested: usize,
        result: Result<usize>,
    ) -> Result<usize> {
        if let (Err(err), Some(log)) = (&result, self.log.as_mut()) {
            let entry = error_entry(op, stream, err).with_bytes(requested as u64);
            let _ = log.emit_entry(entry);
        }
        result
    }
}

fn error_entry(op: &str, stream: Option<&str>, err: &StdioError) -> LogEntry {
    let mut entry = LogEntry::new("", LogLevel::Warn, "error")
        .with_op(op)
        .with_errno(err.errno())
        .with_details(json!({
            "kind": err.kind_name(),
            "message": err.to_string(),
        }));
    if let Some(stream) = stream {
        entry = entry.with_stream(stream);
    }
    entry
}
