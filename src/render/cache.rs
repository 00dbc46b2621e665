use crate::io::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Layer raster ready to be stacked: canvas-sized, premultiplied RGBA8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLayer {
    /// Premultiplied RGBA8 pixels, row-major, canvas width x height
    pub rgba8_premul: Vec<u8>,
}

/// Memoization cache for decoded layer assets
///
/// Every item of an edition reuses the same few layer files, so each asset is
/// decoded and fitted to the canvas once per run. Safe to share across export
/// workers; two workers racing on the same asset may both decode it.
#[derive(Default)]
pub struct AssetCache {
    /// Asset path to prepared raster mapping
    entries: Mutex<HashMap<PathBuf, Arc<PreparedLayer>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

/// Performance metrics for cache effectiveness
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
}

impl AssetCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a cached raster or load and store a new one
    ///
    /// The loader runs without the lock held. Failed loads are not cached.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error
    pub fn get_or_load<F>(&self, asset: &Path, load: F) -> Result<Arc<PreparedLayer>>
    where
        F: FnOnce() -> Result<PreparedLayer>,
    {
        if let Some(found) = self.lock().get(asset) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(found));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let prepared = Arc::new(load()?);
        let stored = self
            .lock()
            .entry(asset.to_path_buf())
            .or_insert(prepared)
            .clone();
        Ok(stored)
    }

    /// Current hit and miss counts
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of cached assets
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<PreparedLayer>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
