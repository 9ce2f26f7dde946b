//! Content-addressed blob store for all-pairs route matrices.
//!
//! The all-pairs computation is O(V³), so its distance and next-hop matrices
//! are memoised on disk. The cache is purely an optimisation: a missing,
//! unreadable or wrongly sized entry means "recompute", never an error for
//! the caller.
//!
//! # Key
//!
//! [`cache_key`] seeds a BLAKE3 hasher with the capacity threshold and folds
//! in every entry of the *initial* distance matrix in row-major order. The
//! first eight digest bytes form the key; the file name is the key as 16
//! lowercase hex digits.
//!
//! # Blob layout
//!
//! ```text
//! dist: V*V × i64   (little-endian, row-major)
//! next: V*V × usize (little-endian, row-major, platform width)
//! ```
//!
//! A blob is accepted only if its length is exactly
//! `V*V*(8 + size_of::<usize>())` bytes.

use std::fs;
use std::io;
use std::mem::size_of;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Errors returned by [`MatrixCache`] I/O.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cache entry {path} has {actual} bytes, expected {expected}")]
    SizeMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },
}

/// Route matrices as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMatrices {
    pub dist: Vec<i64>,
    pub next: Vec<usize>,
}

/// Derive the cache key for a threshold and an initial distance matrix.
#[must_use]
pub fn cache_key(amount: u64, initial_dist: &[i64]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&amount.to_le_bytes());
    for value in initial_dist {
        hasher.update(&value.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// Exact blob length for a `vertex_count × vertex_count` matrix pair.
#[must_use]
pub const fn expected_len(vertex_count: usize) -> usize {
    vertex_count * vertex_count * (size_of::<i64>() + size_of::<usize>())
}

/// File-system blob store rooted at a configurable directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixCache {
    root: PathBuf,
}

impl MatrixCache {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob for `key`.
    #[must_use]
    pub fn entry_path(&self, key: u64) -> PathBuf {
        self.root.join(format!("{key:016x}"))
    }

    /// Load the matrices stored under `key`.
    ///
    /// Returns `Ok(None)` when no entry exists.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the entry exists but cannot be read, or
    /// [`CacheError::SizeMismatch`] if its length does not match
    /// `vertex_count`.
    pub fn load(&self, key: u64, vertex_count: usize) -> Result<Option<CachedMatrices>, CacheError> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "cache entry absent");
                return Ok(None);
            }
            Err(e) => {
                return Err(CacheError::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        let expected = expected_len(vertex_count);
        if bytes.len() != expected {
            return Err(CacheError::SizeMismatch {
                path: path.display().to_string(),
                expected,
                actual: bytes.len(),
            });
        }

        let cells = vertex_count * vertex_count;
        let (dist_bytes, next_bytes) = bytes.split_at(cells * size_of::<i64>());

        let dist = dist_bytes
            .chunks_exact(size_of::<i64>())
            .map(|chunk| {
                let mut raw = [0u8; size_of::<i64>()];
                raw.copy_from_slice(chunk);
                i64::from_le_bytes(raw)
            })
            .collect();
        let next = next_bytes
            .chunks_exact(size_of::<usize>())
            .map(|chunk| {
                let mut raw = [0u8; size_of::<usize>()];
                raw.copy_from_slice(chunk);
                usize::from_le_bytes(raw)
            })
            .collect();

        Ok(Some(CachedMatrices { dist, next }))
    }

    /// Store `dist` followed by `next` under `key`.
    ///
    /// Parent directories are created automatically.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory or file cannot be written.
    pub fn store(&self, key: u64, dist: &[i64], next: &[usize]) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.root).map_err(|e| CacheError::Io {
            path: self.root.display().to_string(),
            source: e,
        })?;

        let mut bytes = Vec::with_capacity(dist.len() * size_of::<i64>() + next.len() * size_of::<usize>());
        for value in dist {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for value in next {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        let path = self.entry_path(key);
        fs::write(&path, &bytes).map_err(|e| CacheError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "cache entry written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn key_depends_on_amount_and_entries() {
        let dist = [0, 5, i64::MAX, 0];
        let base = cache_key(100, &dist);
        assert_eq!(base, cache_key(100, &dist), "deterministic");
        assert_ne!(base, cache_key(101, &dist));
        assert_ne!(base, cache_key(100, &[0, 6, i64::MAX, 0]));
        assert_ne!(base, cache_key(100, &[5, 0, i64::MAX, 0]), "order matters");
    }

    #[test]
    fn entry_path_is_fixed_width_hex() {
        let cache = MatrixCache::new("/tmp/lngraph");
        let path = cache.entry_path(0xab);
        assert_eq!(path.file_name().and_then(|s| s.to_str()), Some("00000000000000ab"));
    }

    #[test]
    fn missing_entry_is_none() {
        let dir = TempDir::new().expect("tempdir");
        let cache = MatrixCache::new(dir.path());
        assert!(cache.load(42, 3).expect("load").is_none());
    }

    #[test]
    fn store_then_load_roundtrip() {
        let dir = TempDir::new().expect("tempdir");
        let cache = MatrixCache::new(dir.path().join("nested"));
        let dist = vec![0, 3, i64::MAX, 0];
        let next = vec![0, 1, usize::MAX, 1];
        cache.store(7, &dist, &next).expect("store");

        let loaded = cache.load(7, 2).expect("load").expect("present");
        assert_eq!(loaded.dist, dist);
        assert_eq!(loaded.next, next);
    }

    #[test]
    fn wrong_size_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let cache = MatrixCache::new(dir.path());
        cache.store(9, &[0, 1, 1, 0], &[0, 1, 0, 1]).expect("store");

        match cache.load(9, 3) {
            Err(CacheError::SizeMismatch { expected, actual, .. }) => {
                assert_eq!(expected, expected_len(3));
                assert_eq!(actual, expected_len(2));
            }
            other => panic!("expected size mismatch, got {other:?}"),
        }
    }

    #[test]
    fn truncated_entry_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let cache = MatrixCache::new(dir.path());
        fs::write(cache.entry_path(1), [0u8; 5]).expect("write junk");
        assert!(matches!(cache.load(1, 1), Err(CacheError::SizeMismatch { .. })));
    }
}
