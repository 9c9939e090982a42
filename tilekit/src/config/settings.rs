//! Layer configuration structs and their defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_MEMORY_SIZE;
use crate::retrieve::{RetrievalProperties, RetrievalServiceConfig, DEFAULT_POOL_SIZE};
use crate::tile::{LevelSet, DEFAULT_LEVEL_ZERO_TILE_DELTA, DEFAULT_TILE_SIZE};

pub const DEFAULT_LAYER_NAME: &str = "layer";
pub const DEFAULT_DATASET: &str = "default";
pub const DEFAULT_FORMAT: &str = "image/png";
pub const DEFAULT_LEVEL_COUNT: u32 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 20_000;

/// Default on-disk tile directory: `~/.cache/tilekit` on Linux.
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tilekit")
}

/// A complete layer description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerConfig {
    pub layer: LayerSettings,
    pub retrieval: RetrievalSettings,
    pub cache: CacheSettings,
    /// `[delegates]` definitions in document order.
    pub delegates: Vec<String>,
}

/// `[layer]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSettings {
    pub name: String,
    pub dataset: String,
    /// URL template of the tiles' own locators.
    pub service: String,
    /// Image MIME type.
    pub format: String,
    pub levels: u32,
    pub level_zero_tile_delta: f64,
    pub tile_size: u32,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_LAYER_NAME.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            service: String::new(),
            format: DEFAULT_FORMAT.to_string(),
            levels: DEFAULT_LEVEL_COUNT,
            level_zero_tile_delta: DEFAULT_LEVEL_ZERO_TILE_DELTA,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// `[retrieval]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub use_cache: bool,
    pub pool_size: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            use_cache: true,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: PathBuf,
    pub memory_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            memory_size: DEFAULT_MEMORY_SIZE,
        }
    }
}

impl LayerConfig {
    /// Levels described by the `[layer]` section.
    pub fn level_set(&self) -> LevelSet {
        LevelSet::new(
            &self.layer.dataset,
            &self.layer.service,
            &self.layer.format,
            self.layer.levels,
            self.layer.level_zero_tile_delta,
            self.layer.tile_size,
        )
    }

    /// Per-request settings from the `[retrieval]` section.
    pub fn retrieval_properties(&self) -> RetrievalProperties {
        RetrievalProperties::default()
            .with_connect_timeout(self.retrieval.connect_timeout)
            .with_read_timeout(self.retrieval.read_timeout)
            .with_use_cache(self.retrieval.use_cache)
    }

    pub fn service_config(&self) -> RetrievalServiceConfig {
        RetrievalServiceConfig::default().with_pool_size(self.retrieval.pool_size)
    }
}
