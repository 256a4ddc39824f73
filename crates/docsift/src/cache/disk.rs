//! MessagePack file backend.
//!
//! One `<hash>.msgpack` file per entry. Writes go to a uniquely named temp
//! file first and are renamed into place, so readers never observe a
//! partially written entry. Entries are encoded with field names because
//! optional result fields are skipped when absent.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use super::{CacheBackend, CacheEntry, compute_content_hash};
use crate::error::{DocsiftError, Result};

const ENTRY_EXTENSION: &str = "msgpack";

#[derive(Debug)]
pub struct DiskCacheBackend {
    cache_dir: PathBuf,
}

impl DiskCacheBackend {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).map_err(|e| {
            DocsiftError::cache_with_source(
                format!("Failed to create cache directory {}", cache_dir.display()),
                e,
            )
        })?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    // Fingerprints contain ':', so file names use a hash of the key instead.
    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", compute_content_hash(key.as_bytes()), ENTRY_EXTENSION))
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| DocsiftError::cache_with_source("Failed to read cache directory", e))?;

        Ok(entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION))
            .collect())
    }

    fn read_entry(path: &Path) -> Result<CacheEntry> {
        let bytes =
            fs::read(path).map_err(|e| DocsiftError::cache_with_source("Failed to read cache file", e))?;
        rmp_serde::from_slice(&bytes).map_err(|e| DocsiftError::cache_with_source("Failed to deserialize cache entry", e))
    }
}

impl CacheBackend for DiskCacheBackend {
    fn name(&self) -> &str {
        "disk"
    }

    fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let entry = Self::read_entry(&path)?;
        // Hash collision between two fingerprints.
        if entry.key != key {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn store(&self, entry: CacheEntry) -> Result<()> {
        let path = self.entry_path(&entry.key);
        let serialized = rmp_serde::to_vec_named(&entry)
            .map_err(|e| DocsiftError::cache_with_source("Failed to serialize cache entry", e))?;

        let pid = std::process::id();
        let thread_id = std::thread::current().id();
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let file_stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("entry");
        let temp_path = self
            .cache_dir
            .join(format!("{}.tmp.{}.{:?}.{}", file_stem, pid, thread_id, timestamp));

        fs::write(&temp_path, &serialized)
            .map_err(|e| DocsiftError::cache_with_source("Failed to write temp cache file", e))?;

        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            DocsiftError::cache_with_source("Failed to rename cache file", e)
        })
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DocsiftError::cache_with_source("Failed to remove cache file", e)),
        }
    }

    fn remove_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        // Re-read right before unlinking so a fresh entry renamed into place
        // after the caller's load survives.
        match self.load(key) {
            Ok(Some(entry)) if !entry.is_live_at(now) => self.remove(key),
            Ok(_) => Ok(false),
            Err(_) => self.remove(key),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for path in self.entry_files()? {
            match Self::read_entry(&path) {
                Ok(entry) => keys.push(entry.key),
                Err(e) => tracing::warn!(path = %path.display(), "Skipping unreadable cache file: {}", e),
            }
        }
        Ok(keys)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entry_files()?.len())
    }

    fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_files()? {
            if fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_files()? {
            let expired = match Self::read_entry(&path) {
                Ok(entry) => !entry.is_live_at(now),
                // Unreadable files can never produce a hit.
                Err(_) => true,
            };
            if expired && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
