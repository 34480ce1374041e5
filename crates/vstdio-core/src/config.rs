//! Store configuration.
//!
//! Configuration is explicit: build a [`StoreConfig`] (by hand, or from the
//! environment with [`StoreConfig::from_env`]) and pass it to
//! [`StreamStore::with_config`](crate::StreamStore::with_config).
//!
//! Environment variables:
//! - `VSTDIO_SEEK_POLICY`: `bounded` (default) or `sparse`.
//! - `VSTDIO_MAX_STREAM_LEN`: decimal byte cap on any single stream.
//!
//! Under [`SeekPolicy::SparseWrite`] a seek may land at most
//! [`MAX_SPARSE_GAP`] bytes past the end, or at the stream cap when one is set.

/// Environment variable selecting the seek policy.
pub const SEEK_POLICY_ENV: &str = "VSTDIO_SEEK_POLICY";
/// Environment variable capping stream length.
pub const MAX_STREAM_LEN_ENV: &str = "VSTDIO_MAX_STREAM_LEN";

/// Furthest a sparse seek may land past the end of an uncapped stream.
pub const MAX_SPARSE_GAP: usize = 1 << 20;

/// Which seek targets a handle may land on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekPolicy {
    /// The cursor never moves past the buffer's current length.
    /// Only a write may extend a buffer.
    #[default]
    Bounded,
    /// Writable handles may seek past the end. The next write zero-fills
    /// the gap; reads past the end transfer nothing.
    SparseWrite,
}

impl SeekPolicy {
    /// Parse from string (case-insensitive). Unknown values select `Bounded`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "sparse" | "sparse-write" | "sparse_write" | "holes" => Self::SparseWrite,
            _ => Self::Bounded,
        }
    }

    /// Returns true if a seek past the end is acceptable for a handle
    /// with the given writability.
    #[must_use]
    pub const fn allows_past_end(self, writable: bool) -> bool {
        matches!(self, Self::SparseWrite) && writable
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bounded => "bounded",
            Self::SparseWrite => "sparse",
        }
    }
}

/// Knobs applied to every stream a store hands out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub seek_policy: SeekPolicy,
    /// Upper bound on any buffer's length. Writes past it are short.
    pub max_stream_len: Option<usize>,
}

impl StoreConfig {
    #[must_use]
    pub fn with_seek_policy(mut self, policy: SeekPolicy) -> Self {
        self.seek_policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_stream_len(mut self, len: usize) -> Self {
        self.max_stream_len = Some(len);
        self
    }

    /// Highest cursor a seek may land on in a buffer of `length` bytes.
    ///
    /// `length` itself unless the sparse policy applies to this handle, in
    /// which case the stream cap (or `length + MAX_SPARSE_GAP`) bounds it.
    #[must_use]
    pub fn seek_limit(&self, length: usize, writable: bool) -> usize {
        if !self.seek_policy.allows_past_end(writable) {
            return length;
        }
        match self.max_stream_len {
            Some(cap) => cap.max(length),
            None => length.saturating_add(MAX_SPARSE_GAP),
        }
    }

    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable length caps are ignored.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let seek_policy = lookup(SEEK_POLICY_ENV)
            .map(|v| SeekPolicy::from_str_loose(&v))
            .unwrap_or_default();
        let max_stream_len = lookup(MAX_STREAM_LEN_ENV).and_then(|v| v.trim().parse().ok());
        Self {
            seek_policy,
            max_stream_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seek_policies() {
        assert_eq!(SeekPolicy::from_str_loose("bounded"), SeekPolicy::Bounded);
        assert_eq!(SeekPolicy::from_str_loose("SPARSE"), SeekPolicy::SparseWrite);
        assert_eq!(
            SeekPolicy::from_str_loose(" sparse-write "),
            SeekPolicy::SparseWrite
        );
        assert_eq!(SeekPolicy::from_str_loose("garbage"), SeekPolicy::Bounded);
        assert_eq!(SeekPolicy::from_str_loose(""), SeekPolicy::Bounded);
    }

    #[test]
    fn sparse_only_applies_to_writable_handles() {
        assert!(!SeekPolicy::Bounded.allows_past_end(true));
        assert!(!SeekPolicy::SparseWrite.allows_past_end(false));
        assert!(SeekPolicy::SparseWrite.allows_past_end(true));
    }

    #[test]
    fn seek_limit_bounds_sparse_targets() {
        let bounded = StoreConfig::default();
        assert_eq!(bounded.seek_limit(22, true), 22);

        let sparse = StoreConfig::default().with_seek_policy(SeekPolicy::SparseWrite);
        assert_eq!(sparse.seek_limit(22, false), 22);
        assert_eq!(sparse.seek_limit(22, true), 22 + MAX_SPARSE_GAP);
        assert_eq!(sparse.seek_limit(usize::MAX, true), usize::MAX);

        let capped = sparse.with_max_stream_len(64);
        assert_eq!(capped.seek_limit(22, true), 64);
        assert_eq!(capped.seek_limit(100, true), 100);
    }

    #[test]
    fn from_lookup_reads_both_keys() {
        let cfg = StoreConfig::from_lookup(|key| match key {
            SEEK_POLICY_ENV => Some("sparse".into()),
            MAX_STREAM_LEN_ENV => Some("4096".into()),
            _ => None,
        });
        assert_eq!(cfg.seek_policy, SeekPolicy::SparseWrite);
        assert_eq!(cfg.max_stream_len, Some(4096));
    }

    #[test]
    fn from_lookup_defaults() {
        let cfg = StoreConfig::from_lookup(|_| None);
        assert_eq!(cfg, StoreConfig::default());

        let cfg = StoreConfig::from_lookup(|key| {
            (key == MAX_STREAM_LEN_ENV).then(|| "lots".to_string())
        });
        assert_eq!(cfg.max_stream_len, None);
    }
}
