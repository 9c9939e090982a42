//! Delegate roles and the capability value that exposes them.
//!
//! A delegate is a pipeline stage built from a definition string. It plays
//! one or more roles; [`Delegate::capabilities`] reports which, once, as a
//! set of typed references the [`DelegateKit`](super::DelegateKit) routes
//! into its slots.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use url::Url;

use super::error::{DecodeError, TileLoadError};
use crate::cache::FileStore;
use crate::render::DrawContext;
use crate::retrieve::{RetrievalPostProcessor, Retriever};
use crate::tile::{Level, Sector, Tile, TileKey};

/// A pipeline stage constructed from a definition string.
///
/// Instances are immutable. Two delegates are equal when their definitions
/// are equal.
pub trait Delegate: Send + Sync + fmt::Debug {
    /// Canonical definition string, the exact inverse of parsing.
    fn to_definition(&self) -> String;

    /// The roles this delegate plays.
    fn capabilities(self: Arc<Self>) -> Capabilities;
}

/// Builds retrievers for URLs.
pub trait RetrieverFactory: Send + Sync {
    fn create_retriever(
        &self,
        url: &Url,
        post_processor: Arc<dyn RetrievalPostProcessor>,
    ) -> Box<dyn Retriever>;
}

/// Computes the remote locator of a tile.
pub trait TileUrlBuilder: Send + Sync {
    fn build_url(&self, tile: &Tile, format: &str) -> Result<Url, url::ParseError>;
}

/// Decodes a local tile file.
pub trait TileReader: Send + Sync {
    /// `Ok(None)` passes the tile on to the next reader.
    fn read_image(&self, tile: &Tile, url: &Url) -> Result<Option<RgbaImage>, DecodeError>;
}

/// Pure raster-to-raster transformation.
pub trait ImageTransformer: Send + Sync {
    fn transform(&self, image: &RgbaImage, tile: Option<&Tile>) -> RgbaImage;
}

/// Hooks around the tile draw call. Runs on the graphics thread; must not block.
pub trait RenderDelegate: Send + Sync {
    fn pre_render(&self, dc: &mut dyn DrawContext);
    fn post_render(&self, dc: &mut dyn DrawContext);
}

/// Decides how a tile's texture gets loaded.
pub trait TileRequester: Send + Sync {
    /// Load synchronously from local storage. Returns whether a texture was loaded.
    fn force_texture_load(&self, tile: &Tile, loader: &dyn TileLoader) -> Result<bool, TileLoadError>;

    /// Local file holding the tile, if present.
    fn local_tile_url(&self, tile: &Tile, loader: &dyn TileLoader) -> Option<Url>;

    /// Background task that loads the tile, retrieving it first if needed.
    fn create_request_task(&self, tile: Tile, loader: Arc<dyn TileLoader>) -> RequestTask;
}

/// Creates tiles and maps them onto cache keys.
///
/// The tile returned by `create_texture_tile` must carry
/// `transform_tile_key(raw, level)` as its key. [`DelegateKit`] re-keys tiles
/// that do not, so caches only ever see transformed keys.
///
/// [`DelegateKit`]: super::DelegateKit
pub trait TileFactory: Send + Sync {
    fn create_texture_tile(&self, sector: Sector, level: &Arc<Level>, row: u32, col: u32) -> Tile;

    /// Map a raw key on `level` to its cache key.
    fn transform_tile_key(&self, key: &TileKey, level: &Level) -> TileKey;
}

/// Host-side operations a requester drives. Implemented by
/// [`TiledLayer`](crate::layer::TiledLayer).
pub trait TileLoader: Send + Sync {
    /// Name used as the retrieval caller.
    fn name(&self) -> &str;

    fn file_store(&self) -> &FileStore;

    /// Decode, transform, and cache the tile from a local file.
    fn load_texture(&self, tile: &Tile, url: &Url) -> Result<bool, TileLoadError>;

    /// Retrieve the tile into the file store. Returns whether bytes were stored.
    fn retrieve_remote(&self, tile: &Tile) -> Result<bool, TileLoadError>;
}

type TaskFn = Box<dyn FnOnce(&Tile) -> Result<bool, TileLoadError> + Send>;

/// A deferred tile load.
pub struct RequestTask {
    tile: Tile,
    run: TaskFn,
}

impl RequestTask {
    pub fn new<F>(tile: Tile, run: F) -> Self
    where
        F: FnOnce(&Tile) -> Result<bool, TileLoadError> + Send + 'static,
    {
        Self {
            tile,
            run: Box::new(run),
        }
    }

    pub fn tile(&self) -> &Tile {
        &self.tile
    }

    /// Execute the load. Returns whether a texture ended up in the cache.
    pub fn run(self) -> Result<bool, TileLoadError> {
        (self.run)(&self.tile)
    }
}

impl fmt::Debug for RequestTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTask").field("tile", &self.tile).finish()
    }
}

/// Typed references to the roles a delegate plays.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub retriever_factory: Option<Arc<dyn RetrieverFactory>>,
    pub url_builder: Option<Arc<dyn TileUrlBuilder>>,
    pub tile_reader: Option<Arc<dyn TileReader>>,
    pub image_transformer: Option<Arc<dyn ImageTransformer>>,
    pub render: Option<Arc<dyn RenderDelegate>>,
    pub tile_requester: Option<Arc<dyn TileRequester>>,
    pub tile_factory: Option<Arc<dyn TileFactory>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retriever_factory(mut self, role: Arc<dyn RetrieverFactory>) -> Self {
        self.retriever_factory = Some(role);
        self
    }

    pub fn with_url_builder(mut self, role: Arc<dyn TileUrlBuilder>) -> Self {
        self.url_builder = Some(role);
        self
    }

    pub fn with_tile_reader(mut self, role: Arc<dyn TileReader>) -> Self {
        self.tile_reader = Some(role);
        self
    }

    pub fn with_image_transformer(mut self, role: Arc<dyn ImageTransformer>) -> Self {
        self.image_transformer = Some(role);
        self
    }

    pub fn with_render(mut self, role: Arc<dyn RenderDelegate>) -> Self {
        self.render = Some(role);
        self
    }

    pub fn with_tile_requester(mut self, role: Arc<dyn TileRequester>) -> Self {
        self.tile_requester = Some(role);
        self
    }

    pub fn with_tile_factory(mut self, role: Arc<dyn TileFactory>) -> Self {
        self.tile_factory = Some(role);
        self
    }

    /// Names of the roles present, in slot order.
    pub fn roles(&self) -> Vec<&'static str> {
        let mut roles = Vec::new();
        if self.retriever_factory.is_some() {
            roles.push("retriever-factory");
        }
        if self.url_builder.is_some() {
            roles.push("url-builder");
        }
        if self.tile_reader.is_some() {
            roles.push("tile-reader");
        }
        if self.image_transformer.is_some() {
            roles.push("image-transformer");
        }
        if self.render.is_some() {
            roles.push("render");
        }
        if self.tile_requester.is_some() {
            roles.push("tile-requester");
        }
        if self.tile_factory.is_some() {
            roles.push("tile-factory");
        }
        roles
    }

    pub fn is_empty(&self) -> bool {
        self.roles().is_empty()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capabilities").field(&self.roles()).finish()
    }
}
