use crate::error::Result;
use crate::fsutil;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache for expensive, repeatable external fetches (a git clone, chiefly),
/// keyed by source identity. Populated lazily during one build attempt and
/// cleared unconditionally at its end, so no state leaks into the next run.
///
/// Concurrent requests for one key coalesce: the first caller runs the
/// fetch, later callers for that key block on the same cell and share the
/// result.
#[derive(Debug)]
pub struct FetchCache {
    root: PathBuf,
    entries: Mutex<HashMap<String, Arc<OnceCell<PathBuf>>>>,
    scratch_seq: AtomicU64,
}

impl FetchCache {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            entries: Mutex::new(HashMap::new()),
            scratch_seq: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the materialized path for `key`, running `fetch` at most once
    /// per key per build attempt. The closure receives a private slot
    /// directory under the cache root and returns the path it populated.
    pub fn materialize<F>(&self, key: &str, fetch: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<PathBuf>,
    {
        let cell = {
            let mut entries = self.entries.lock();
            entries.entry(key.to_string()).or_default().clone()
        };
        cell.get_or_try_init(|| {
            let slot = self.slot_dir(key);
            fsutil::ensure_dir(&slot)?;
            fetch(&slot)
        })
        .cloned()
    }

    /// A fresh scratch directory under the cache root for one-off work
    /// (tarball extraction, per-ref checkouts). Wiped by `clear` with
    /// everything else.
    pub fn scratch_dir(&self, label: &str) -> Result<PathBuf> {
        let seq = self.scratch_seq.fetch_add(1, Ordering::Relaxed);
        let mut dir = self.root.join("scratch");
        dir.push(format!("{}-{seq}", sanitize(label)));
        fsutil::ensure_dir(&dir)?;
        Ok(dir)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty() && !self.root.exists()
    }

    /// Drop every cached entry and remove everything materialized under the
    /// cache root. Safe to call when nothing was cached.
    pub fn clear(&self) -> Result<()> {
        self.entries.lock().clear();
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }

    fn slot_dir(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        let hex = hex::encode(digest);
        self.root.join("sources").join(&hex[..16])
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Scoped acquisition of the cache for one build attempt: dropping the
/// session clears the cache, on every exit path. The builder holds exactly
/// one of these per attempt.
#[derive(Debug)]
pub struct CacheSession {
    cache: Arc<FetchCache>,
}

impl CacheSession {
    pub fn new(cache: Arc<FetchCache>) -> Self {
        Self { cache }
    }
}

impl Drop for CacheSession {
    fn drop(&mut self) {
        // A cleanup failure must not mask the build's own outcome.
        let _ = self.cache.clear();
    }
}
