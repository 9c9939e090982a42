//! In-memory texture cache with size-bounded eviction using moka.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use moka::sync::Cache;
use tracing::debug;

use crate::tile::TileKey;

/// Default memory budget: 256 MB.
pub const DEFAULT_MEMORY_SIZE: u64 = 256 * 1024 * 1024;

/// Texture store keyed by transformed tile key.
///
/// Writes are atomic per key: a reader sees either the previous texture or
/// the complete new one.
pub trait TextureCache: Send + Sync {
    fn get(&self, key: &TileKey) -> Option<Arc<RgbaImage>>;

    fn put(&self, key: TileKey, texture: Arc<RgbaImage>);

    fn contains(&self, key: &TileKey) -> bool;

    fn remove(&self, key: &TileKey);
}

/// Hit/miss counters and current occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
    pub size_bytes: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 when there were none.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries, {} bytes, {} hits, {} misses",
            self.entries, self.size_bytes, self.hits, self.misses
        )
    }
}

/// Memory cache weighted by decoded texture size.
pub struct MemoryTextureCache {
    cache: Cache<TileKey, Arc<RgbaImage>>,
    max_size_bytes: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryTextureCache {
    /// Create a cache holding at most `max_size_bytes` of pixel data.
    pub fn new(max_size_bytes: u64) -> Self {
        let cache = Cache::builder()
            .weigher(|_key: &TileKey, value: &Arc<RgbaImage>| -> u32 {
                // moka weights are u32, oversized textures saturate
                value.as_raw().len().min(u32::MAX as usize) as u32
            })
            .max_capacity(max_size_bytes)
            .build();

        Self {
            cache,
            max_size_bytes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
            size_bytes: self.cache.weighted_size(),
        }
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }
}

impl Default for MemoryTextureCache {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

impl TextureCache for MemoryTextureCache {
    fn get(&self, key: &TileKey) -> Option<Arc<RgbaImage>> {
        match self.cache.get(key) {
            Some(texture) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(texture)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: TileKey, texture: Arc<RgbaImage>) {
        debug!(key = %key, bytes = texture.as_raw().len(), "Caching texture");
        self.cache.insert(key, texture);
    }

    fn contains(&self, key: &TileKey) -> bool {
        self.cache.contains_key(key)
    }

    fn remove(&self, key: &TileKey) {
        self.cache.invalidate(key);
    }
}
