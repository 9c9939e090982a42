//! Tile requesters: where a tile's bytes come from and when they load.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use super::definition::Definition;
use super::error::TileLoadError;
use super::registry::{DelegateContext, DelegateType};
use super::traits::{Capabilities, Delegate, RequestTask, TileLoader, TileRequester};
use crate::tile::Tile;

/// `UrlRequester()`: local file store first, remote retrieval second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlRequester;

impl UrlRequester {
    pub const NAME: &'static str = "UrlRequester";

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        (def.is(Self::NAME) && def.args().is_empty()).then_some(Self)
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }
}

impl Delegate for UrlRequester {
    fn to_definition(&self) -> String {
        format!("{}()", Self::NAME)
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_tile_requester(self)
    }
}

fn stored_url(tile: &Tile, loader: &dyn TileLoader) -> Option<Url> {
    loader.file_store().find_url(&tile.path())
}

impl TileRequester for UrlRequester {
    fn force_texture_load(&self, tile: &Tile, loader: &dyn TileLoader) -> Result<bool, TileLoadError> {
        match stored_url(tile, loader) {
            Some(url) => loader.load_texture(tile, &url),
            None => Ok(false),
        }
    }

    fn local_tile_url(&self, tile: &Tile, loader: &dyn TileLoader) -> Option<Url> {
        stored_url(tile, loader)
    }

    fn create_request_task(&self, tile: Tile, loader: Arc<dyn TileLoader>) -> RequestTask {
        RequestTask::new(tile, move |tile| {
            let loader = loader.as_ref();

            if let Some(url) = stored_url(tile, loader) {
                match loader.load_texture(tile, &url) {
                    Ok(true) => return Ok(true),
                    Ok(false) => {}
                    Err(e) => {
                        warn!(tile = %tile, error = %e, "Stored tile unreadable, retrieving again");
                        if let Err(e) = loader.file_store().remove(&tile.path()) {
                            warn!(tile = %tile, error = %e, "Failed to remove unreadable tile");
                        }
                    }
                }
            }

            if !loader.retrieve_remote(tile)? {
                debug!(tile = %tile, "Nothing retrieved");
                return Ok(false);
            }

            match stored_url(tile, loader) {
                Some(url) => loader.load_texture(tile, &url),
                None => Ok(false),
            }
        })
    }
}

/// `LocalRequester()`: tiles live at their own `file://` locator and are
/// never retrieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalRequester;

impl LocalRequester {
    pub const NAME: &'static str = "LocalRequester";

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        (def.is(Self::NAME) && def.args().is_empty()).then_some(Self)
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }
}

impl Delegate for LocalRequester {
    fn to_definition(&self) -> String {
        format!("{}()", Self::NAME)
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_tile_requester(self)
    }
}

fn own_file_url(tile: &Tile) -> Option<Url> {
    let url = tile.resource_url(tile.level().format()).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()?.is_file().then_some(url)
}

impl TileRequester for LocalRequester {
    fn force_texture_load(&self, tile: &Tile, loader: &dyn TileLoader) -> Result<bool, TileLoadError> {
        match own_file_url(tile) {
            Some(url) => loader.load_texture(tile, &url),
            None => Ok(false),
        }
    }

    fn local_tile_url(&self, tile: &Tile, _loader: &dyn TileLoader) -> Option<Url> {
        own_file_url(tile)
    }

    fn create_request_task(&self, tile: Tile, loader: Arc<dyn TileLoader>) -> RequestTask {
        RequestTask::new(tile, move |tile| match own_file_url(tile) {
            Some(url) => loader.load_texture(tile, &url),
            None => Ok(false),
        })
    }
}
