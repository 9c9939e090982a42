//! Tiled imagery layers.
//!
//! A [`TiledLayer`] owns a [`DelegateKit`], a local [`FileStore`] and a
//! shared [`TextureCache`], and drives tile loads through the kit:
//!
//! ```text
//! create_tile ─► request_texture ─► requester task (blocking pool)
//!                                     ├─ stored file? ─► load_texture
//!                                     └─ retrieve_remote ─► FileStore ─► load_texture
//! load_texture: read_image ─► transform_image ─► cache.put(transformed key)
//! ```
//!
//! Textures are cached and looked up only by the kit's transformed key, so
//! layers addressing the same imagery differently share cache entries.

use std::fmt;
use std::sync::Arc;

use dashmap::DashSet;
use image::RgbaImage;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{FileStore, SaveToFileProcessor, TextureCache};
use crate::config::LayerConfig;
use crate::delegate::{
    DelegateContext, DelegateError, DelegateFactory, DelegateKit, TileLoadError, TileLoader,
    PARAM_LAYER,
};
use crate::render::DrawContext;
use crate::retrieve::Fetcher;
use crate::tile::{LevelSet, Tile, TileKey};

/// Errors from layer construction and tile access.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("Invalid layer configuration: {0}")]
    Config(#[from] DelegateError),

    #[error("Level {level} does not exist (layer has {count} levels)")]
    InvalidLevel { level: u32, count: usize },

    #[error("Tile {row}/{col} is outside level {level}")]
    TileOutOfRange { level: u32, row: u32, col: u32 },

    #[error("Background requests need a tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Load(#[from] TileLoadError),
}

/// Outcome of [`TiledLayer::request_texture`].
#[derive(Debug)]
pub enum RequestStatus {
    /// Texture already cached; nothing scheduled.
    Cached,
    /// A request for the same cache key is already running.
    InFlight,
    /// Load scheduled; resolves to whether a texture was cached.
    Scheduled(JoinHandle<Result<bool, TileLoadError>>),
}

/// A tiled imagery layer.
pub struct TiledLayer {
    name: String,
    levels: LevelSet,
    kit: DelegateKit,
    store: FileStore,
    cache: Arc<dyn TextureCache>,
    in_flight: DashSet<TileKey>,
}

impl TiledLayer {
    pub fn new(
        name: impl Into<String>,
        levels: LevelSet,
        kit: DelegateKit,
        store: FileStore,
        cache: Arc<dyn TextureCache>,
    ) -> Self {
        Self {
            name: name.into(),
            levels,
            kit,
            store,
            cache,
            in_flight: DashSet::new(),
        }
    }

    /// Build a layer from its configuration.
    ///
    /// Delegates resolve against `factory`; retriever delegates bind to
    /// `fetcher`. Configuration errors prevent the layer from being created.
    pub fn from_config(
        config: &LayerConfig,
        factory: &DelegateFactory,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<dyn TextureCache>,
    ) -> Result<Self, LayerError> {
        let ctx = DelegateContext::new(fetcher)
            .with_param(PARAM_LAYER, config.layer.name.as_str())
            .with_properties(config.retrieval_properties());
        let kit = DelegateKit::from_definitions(&config.delegates, factory, &ctx)?;

        info!(
            layer = %config.layer.name,
            levels = config.layer.levels,
            delegates = kit.entries().len(),
            "Layer created"
        );

        Ok(Self::new(
            config.layer.name.as_str(),
            config.level_set(),
            kit,
            FileStore::new(&config.cache.directory),
            cache,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    pub fn kit(&self) -> &DelegateKit {
        &self.kit
    }

    /// Number of tile loads currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Create the tile at `row`/`col` of `level` through the kit's tile factory.
    pub fn create_tile(&self, level: u32, row: u32, col: u32) -> Result<Tile, LayerError> {
        let lvl = self.levels.level(level).ok_or(LayerError::InvalidLevel {
            level,
            count: self.levels.len(),
        })?;
        if !lvl.contains(row, col) {
            return Err(LayerError::TileOutOfRange { level, row, col });
        }
        Ok(self
            .kit
            .create_texture_tile(lvl.tile_sector(row, col), lvl, row, col))
    }

    /// Cache identity of the tile under this layer's tile factory.
    pub fn cache_key(&self, tile: &Tile) -> TileKey {
        self.kit.transform_tile_key(&tile.raw_key(), tile.level())
    }

    /// Cached texture for the tile.
    pub fn texture(&self, tile: &Tile) -> Option<Arc<RgbaImage>> {
        self.cache.get(&self.cache_key(tile))
    }

    /// Load from local storage only, synchronously.
    pub fn force_texture_load(&self, tile: &Tile) -> Result<bool, LayerError> {
        Ok(self.kit.force_texture_load(tile, self)?)
    }

    /// Local file holding the tile, if present.
    pub fn local_tile_url(&self, tile: &Tile) -> Option<Url> {
        self.kit.local_tile_url(tile, self)
    }

    /// Run the requester's task on the calling thread.
    ///
    /// Returns whether the texture is cached afterwards.
    pub fn load_tile(self: &Arc<Self>, tile: &Tile) -> Result<bool, LayerError> {
        if self.cache.contains(&self.cache_key(tile)) {
            return Ok(true);
        }
        let loader: Arc<dyn TileLoader> = Arc::clone(self) as Arc<dyn TileLoader>;
        Ok(self.kit.create_request_task(tile.clone(), loader).run()?)
    }

    /// Schedule a background load on the tokio blocking pool.
    ///
    /// Cache hits and tiles already in flight are skipped.
    pub fn request_texture(self: &Arc<Self>, tile: Tile) -> Result<RequestStatus, LayerError> {
        let key = self.cache_key(&tile);
        if self.cache.contains(&key) {
            return Ok(RequestStatus::Cached);
        }

        let handle = Handle::try_current().map_err(|_| LayerError::NoRuntime)?;
        if !self.in_flight.insert(key.clone()) {
            debug!(tile = %tile, "Request already in flight");
            return Ok(RequestStatus::InFlight);
        }

        let guard = InFlightGuard {
            layer: Arc::clone(self),
            key,
        };
        let loader: Arc<dyn TileLoader> = Arc::clone(self) as Arc<dyn TileLoader>;
        let task = self.kit.create_request_task(tile, loader);

        let join = handle.spawn_blocking(move || {
            let _guard = guard;
            let tile = task.tile().clone();
            let result = task.run();
            match &result {
                Ok(true) => debug!(tile = %tile, "Tile loaded"),
                Ok(false) => debug!(tile = %tile, "Tile unavailable"),
                Err(e) => warn!(tile = %tile, error = %e, "Tile load failed"),
            }
            result
        });
        Ok(RequestStatus::Scheduled(join))
    }

    /// Draw a cached tile between the kit's render hooks.
    ///
    /// Returns false, drawing nothing, when the tile has no texture yet.
    pub fn render<F>(&self, tile: &Tile, dc: &mut dyn DrawContext, draw: F) -> bool
    where
        F: FnOnce(&mut dyn DrawContext, &RgbaImage),
    {
        let Some(texture) = self.texture(tile) else {
            return false;
        };
        self.kit.pre_render(dc);
        draw(dc, &texture);
        self.kit.post_render(dc);
        true
    }
}

impl TileLoader for TiledLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn file_store(&self) -> &FileStore {
        &self.store
    }

    fn load_texture(&self, tile: &Tile, url: &Url) -> Result<bool, TileLoadError> {
        let image = match self.kit.read_image(tile, url) {
            Ok(Some(image)) => image,
            Ok(None) => return Ok(false),
            Err(e) => {
                warn!(tile = %tile, url = %url, error = %e, "Failed to decode tile");
                return Err(e.into());
            }
        };

        let texture = self.kit.transform_image(image, Some(tile));
        let key = self.cache_key(tile);
        debug!(
            tile = %tile,
            key = %key,
            width = texture.width(),
            height = texture.height(),
            "Caching texture"
        );
        self.cache.put(key, Arc::new(texture));
        Ok(true)
    }

    fn retrieve_remote(&self, tile: &Tile) -> Result<bool, TileLoadError> {
        let url = self.kit.build_remote_url(tile, tile.level().format())?;
        let post = Arc::new(SaveToFileProcessor::new(self.store.clone(), tile.path()));
        let mut retriever = self.kit.create_retriever(&url, post);

        debug!(tile = %tile, url = %url, "Retrieving tile");
        Ok(retriever.retrieve()?.is_some())
    }
}

/// Clears a key from the in-flight set when its load ends, panics included.
struct InFlightGuard {
    layer: Arc<TiledLayer>,
    key: TileKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.layer.in_flight.remove(&self.key);
    }
}

impl fmt::Debug for TiledLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiledLayer")
            .field("name", &self.name)
            .field("levels", &self.levels.len())
            .field("kit", &self.kit)
            .field("store", &self.store)
            .finish()
    }
}
