//! Virtual stream store: the name → buffer table.
//!
//! Names are created lazily by the first writing open and never removed.
//! A buffer outlives every handle opened on it, so content persists across
//! open/close cycles unless a truncating open resets it.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::buffer::{ByteBuffer, SharedBuffer, shared};
use super::file::{OpenKind, OpenMode, StreamHandle, parse_mode};
use crate::config::StoreConfig;
use crate::error::{Result, StdioError};

#[derive(Debug, Default)]
pub struct StreamStore {
    streams: RwLock<BTreeMap<String, SharedBuffer>>,
    config: StoreConfig,
}

impl StreamStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            streams: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// Open `name` under `mode`.
    ///
    /// - `Read`: the name must exist, else `NotFound`. Cursor 0.
    /// - `WriteTruncate`: create or reset to empty. Cursor 0. Handles already
    ///   open on the name clamp their cursors on their next operation.
    /// - `WriteAppend`: create or keep. Cursor at the current length.
    pub fn open(&self, name: &str, mode: OpenMode) -> Result<StreamHandle> {
        let (buffer, cursor) = match mode.kind {
            OpenKind::Read => {
                let streams = self.streams.read();
                let buffer = streams.get(name).cloned().ok_or_else(|| StdioError::NotFound {
                    name: name.to_string(),
                })?;
                (buffer, 0)
            }
            OpenKind::WriteTruncate => {
                let buffer = self.entry(name);
                buffer.lock().reset();
                (buffer, 0)
            }
            OpenKind::WriteAppend => {
                let buffer = self.entry(name);
                let len = buffer.lock().len();
                (buffer, len)
            }
        };
        Ok(StreamHandle::attach(
            Some(Arc::from(name)),
            buffer,
            cursor,
            mode.access(),
            self.config,
        ))
    }

    /// Open with a classic mode string (`"r"`, `"wb"`, `"a+"`, ...).
    pub fn fopen(&self, name: &str, mode: &str) -> Result<StreamHandle> {
        self.open(name, parse_mode(mode)?)
    }

    /// Create `name` with `content`, replacing whatever was there.
    ///
    /// This is how an embedder seeds data files before the engine starts.
    pub fn install(&self, name: &str, content: impl Into<Vec<u8>>) {
        self.entry(name).lock().replace(content.into());
    }

    /// Snapshot of a stream's bytes.
    #[must_use]
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        let streams = self.streams.read();
        streams.get(name).map(|b| b.lock().as_slice().to_vec())
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.streams.read().contains_key(name)
    }

    /// All names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.streams.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }

    fn entry(&self, name: &str) -> SharedBuffer {
        if let Some(existing) = self.streams.read().get(name) {
            return Arc::clone(existing);
        }
        let mut streams = self.streams.write();
        Arc::clone(
            streams
                .entry(name.to_string())
                .or_insert_with(|| shared(ByteBuffer::new())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdio::{Access, Whence};

    #[test]
    fn test_read_open_requires_existing_name() {
        let store = StreamStore::new();
        let err = store.open("missing.cfg", OpenMode::READ).unwrap_err();
        assert_eq!(
            err,
            StdioError::NotFound {
                name: "missing.cfg".into()
            }
        );
        assert!(store.fopen("missing.cfg", "r+").is_err());
        assert!(!store.exists("missing.cfg"));
    }

    #[test]
    fn test_write_open_creates_lazily() {
        let store = StreamStore::new();
        assert!(store.is_empty());
        let h = store.open("save0.dsg", OpenMode::WRITE_TRUNCATE).unwrap();
        assert_eq!(h.name(), Some("save0.dsg"));
        assert_eq!(h.access(), Access::Write);
        assert!(store.exists("save0.dsg"));
        assert_eq!(store.contents("save0.dsg").unwrap(), b"");
    }

    #[test]
    fn test_content_persists_across_close() {
        let store = StreamStore::new();
        let mut w = store.fopen("log.txt", "w").unwrap();
        w.write(b"first").unwrap();
        w.close().unwrap();

        let mut r = store.fopen("log.txt", "r").unwrap();
        assert_eq!(r.read_to_vec(64).unwrap(), b"first");
    }

    #[test]
    fn test_append_starts_at_end() {
        let store = StreamStore::new();
        store.install("log.txt", b"abc".to_vec());
        let mut a = store.open("log.txt", OpenMode::WRITE_APPEND).unwrap();
        assert_eq!(a.tell().unwrap(), 3);
        a.write(b"def").unwrap();
        assert_eq!(store.contents("log.txt").unwrap(), b"abcdef");
    }

    #[test]
    fn test_truncate_resets_shared_buffer() {
        let store = StreamStore::new();
        store.install("data", b"0123456789".to_vec());
        let mut reader = store.fopen("data", "r").unwrap();
        reader.seek(Whence::Start, 7).unwrap();

        let mut writer = store.fopen("data", "w").unwrap();
        assert_eq!(store.contents("data").unwrap(), b"");
        assert_eq!(reader.tell().unwrap(), 0);

        writer.write(b"xyz").unwrap();
        assert_eq!(reader.read_to_vec(8).unwrap(), b"xyz");
    }

    #[test]
    fn test_update_mode_keeps_content() {
        let store = StreamStore::new();
        store.install("cfg", b"hello".to_vec());
        let mut h = store.fopen("cfg", "r+").unwrap();
        assert_eq!(h.access(), Access::ReadWrite);
        h.write(b"J").unwrap();
        assert_eq!(h.read_to_vec(10).unwrap(), b"ello");
        assert_eq!(store.contents("cfg").unwrap(), b"Jello");
    }

    #[test]
    fn test_invalid_mode_string() {
        let store = StreamStore::new();
        assert_eq!(
            store.fopen("x", "q").unwrap_err(),
            StdioError::InvalidMode { mode: "q".into() }
        );
        assert!(!store.exists("x"));
    }

    #[test]
    fn test_names_sorted() {
        let store = StreamStore::new();
        store.install("b", Vec::new());
        store.install("a", Vec::new());
        store.open("c", OpenMode::WRITE_APPEND).unwrap();
        assert_eq!(store.names(), vec!["a", "b", "c"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_config_reaches_handles() {
        let cfg = StoreConfig::default().with_max_stream_len(2);
        let store = StreamStore::with_config(cfg);
        assert_eq!(store.config(), cfg);
        let mut h = store.fopen("cap", "w").unwrap();
        assert_eq!(h.write(b"abcd").unwrap(), 2);
        assert_eq!(store.contents("cap").unwrap(), b"ab");
    }
}
