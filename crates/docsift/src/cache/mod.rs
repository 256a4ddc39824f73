//! Content-addressed, TTL-bound cache for recognition results.
//!
//! Entries are keyed by a fingerprint of the document content hash plus the
//! engine options. The [`CacheStore`] wraps a [`CacheBackend`] and owns the
//! hit/miss/write counters. It never surfaces backend errors: a failed read
//! is logged and counted as a miss, a failed write is logged and skipped.
//!
//! # Example
//!
//! ```rust
//! use docsift::cache::{CacheStore, compute_content_hash};
//! use docsift::types::{OcrResult, ProcessingOptions};
//! use std::time::Duration;
//!
//! let store = CacheStore::in_memory();
//! let hash = compute_content_hash(b"scanned page");
//! let options = ProcessingOptions::new();
//!
//! store.put(&hash, &options, &OcrResult::from_text("hello", 0.9), Duration::from_secs(60));
//! assert_eq!(store.get(&hash, &options).map(|r| r.text), Some("hello".to_string()));
//! ```

#[cfg(feature = "disk-cache")]
pub mod disk;
pub mod memory;

use ahash::AHasher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::core::config::CacheConfig;
use crate::error::Result;
use crate::types::{OcrResult, ProcessingOptions};

#[cfg(feature = "disk-cache")]
pub use disk::DiskCacheBackend;
pub use memory::MemoryCacheBackend;

/// Prefix shared by every fingerprint.
pub const FINGERPRINT_PREFIX: &str = "ocr:";
const OPTIONS_DIGEST_WIDTH: usize = 8;
pub const DEFAULT_SWEEP_THRESHOLD: usize = 100;

/// A cached recognition result. Replaced whole, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub result: OcrResult,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, result: OcrResult, ttl: Duration) -> Self {
        let cached_at = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| cached_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key: key.into(),
            result,
            cached_at,
            expires_at,
        }
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Storage behind a [`CacheStore`].
///
/// Implementations must replace entries atomically: a concurrent reader sees
/// either the old entry or the new one, never a partial write.
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &str;

    fn load(&self, key: &str) -> Result<Option<CacheEntry>>;

    fn store(&self, entry: CacheEntry) -> Result<()>;

    /// Returns whether an entry was removed.
    fn remove(&self, key: &str) -> Result<bool>;

    fn keys(&self) -> Result<Vec<String>>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every entry, returning how many were removed.
    fn clear(&self) -> Result<usize>;

    /// Remove `key` only if the entry stored under it right now is expired at
    /// `now`. A live entry written after the caller's read is left in place.
    fn remove_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        match self.load(key)? {
            Some(entry) if !entry.is_live_at(now) => self.remove(key),
            _ => Ok(false),
        }
    }

    /// Drop every entry that is no longer live at `now`.
    fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for key in self.keys()? {
            if let Some(entry) = self.load(&key)?
                && !entry.is_live_at(now)
                && self.remove(&key)?
            {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub entries: usize,
    /// `hits / (hits + misses)`, 0 before the first lookup.
    pub hit_rate: f64,
}

pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    sweep_threshold: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &self.backend.name())
            .field("sweep_threshold", &self.sweep_threshold)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheBackend::new()))
    }

    /// Build a store from configuration: a directory selects the disk backend,
    /// otherwise entries live in memory.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let store = match &config.directory {
            #[cfg(feature = "disk-cache")]
            Some(directory) => Self::new(Arc::new(DiskCacheBackend::new(directory.clone())?)),
            #[cfg(not(feature = "disk-cache"))]
            Some(directory) => {
                return Err(crate::error::DocsiftError::validation(format!(
                    "Cache directory {} configured but the disk-cache feature is disabled",
                    directory.display()
                )));
            }
            None => Self::in_memory(),
        };
        Ok(store.with_sweep_threshold(config.sweep_threshold))
    }

    /// Entry count at or above which a write triggers an expiry sweep.
    pub fn with_sweep_threshold(mut self, threshold: usize) -> Self {
        self.sweep_threshold = threshold.max(1);
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Cache key for a content hash and option set.
    ///
    /// `"ocr:<hash>"`, plus `":<8 hex>"` digest of the sorted `key=value`
    /// options when there are any.
    pub fn fingerprint(file_hash: &str, options: &ProcessingOptions) -> String {
        match options_digest(options) {
            Some(digest) => format!("{FINGERPRINT_PREFIX}{file_hash}:{digest}"),
            None => format!("{FINGERPRINT_PREFIX}{file_hash}"),
        }
    }

    pub fn get(&self, file_hash: &str, options: &ProcessingOptions) -> Option<OcrResult> {
        let key = Self::fingerprint(file_hash, options);
        let entry = match self.backend.load(&key) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, backend = self.backend.name(), "Cache read failed, treating as miss: {}", e);
                None
            }
        };

        let now = Utc::now();
        match entry {
            Some(entry) if entry.is_live_at(now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Cache hit");
                Some(entry.result)
            }
            Some(_) => {
                if let Err(e) = self.backend.remove_if_expired(&key, now) {
                    tracing::warn!(key = %key, "Failed to remove expired cache entry: {}", e);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Cache entry expired");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Cache miss");
                None
            }
        }
    }

    /// Store a result, replacing any entry with the same fingerprint.
    pub fn put(&self, file_hash: &str, options: &ProcessingOptions, result: &OcrResult, ttl: Duration) {
        let key = Self::fingerprint(file_hash, options);
        let entry = CacheEntry::new(key.clone(), result.clone(), ttl);

        if let Err(e) = self.backend.store(entry) {
            tracing::warn!(key = %key, backend = self.backend.name(), "Cache write failed: {}", e);
            return;
        }
        self.writes.fetch_add(1, Ordering::Relaxed);

        match self.backend.len() {
            Ok(len) if len >= self.sweep_threshold => {
                self.sweep();
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(backend = self.backend.name(), "Failed to count cache entries: {}", e),
        }
    }

    /// Remove every entry for a content hash, whatever options it was stored under.
    pub fn invalidate(&self, file_hash: &str) -> usize {
        if file_hash.is_empty() {
            return 0;
        }

        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), "Failed to list cache keys: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys.iter().filter(|key| key.contains(file_hash)) {
            match self.backend.remove(key) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(key = %key, "Failed to invalidate cache entry: {}", e),
            }
        }
        tracing::debug!(file_hash, removed, "Invalidated cache entries");
        removed
    }

    /// Remove expired entries now.
    pub fn sweep(&self) -> usize {
        match self.backend.remove_expired(Utc::now()) {
            Ok(removed) => {
                if removed > 0 {
                    tracing::debug!(removed, "Swept expired cache entries");
                }
                removed
            }
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), "Cache sweep failed: {}", e);
                0
            }
        }
    }

    /// Remove every entry. Counters are kept.
    pub fn clear(&self) -> usize {
        self.backend.clear().unwrap_or_else(|e| {
            tracing::warn!(backend = self.backend.name(), "Failed to clear cache: {}", e);
            0
        })
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let entries = self.backend.len().unwrap_or_else(|e| {
            tracing::warn!(backend = self.backend.name(), "Failed to count cache entries: {}", e);
            0
        });

        CacheStats {
            hits,
            misses,
            writes: self.writes.load(Ordering::Relaxed),
            entries,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
        }
    }
}

/// 16-hex-digit fingerprint of document bytes.
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = AHasher::default();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn options_digest(options: &ProcessingOptions) -> Option<String> {
    if options.is_empty() {
        return None;
    }

    let canonical = options
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = AHasher::default();
    canonical.hash(&mut hasher);
    let digest = format!("{:016x}", hasher.finish());
    Some(digest[..OPTIONS_DIGEST_WIDTH].to_string())
}
