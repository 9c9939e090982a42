//! The texture tile: one raster at one level/row/column.

use std::fmt;
use std::sync::Arc;

use url::Url;

use super::key::TileKey;
use super::level::{expand_template, Level, Sector};

/// A single imagery tile.
///
/// The raw address is `(level, row, col)` within the level's grid. The
/// [`TileKey`] is the cache identity and may differ from the raw address when
/// the tile factory remaps it; the cache path is always derived from the key.
#[derive(Debug, Clone)]
pub struct Tile {
    sector: Sector,
    level: Arc<Level>,
    row: u32,
    col: u32,
    key: TileKey,
}

impl Tile {
    /// Create a tile whose key is its raw address.
    pub fn new(sector: Sector, level: Arc<Level>, row: u32, col: u32) -> Self {
        let key = TileKey::new(level.dataset(), level.number(), row, col);
        Self {
            sector,
            level,
            row,
            col,
            key,
        }
    }

    /// The raw `(dataset, level, row, col)` address, before any remapping.
    pub fn raw_key(&self) -> TileKey {
        TileKey::new(self.level.dataset(), self.level.number(), self.row, self.col)
    }

    /// Replace the tile's cache key.
    pub fn with_key(mut self, key: TileKey) -> Self {
        self.key = key;
        self
    }

    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    pub fn level(&self) -> &Arc<Level> {
        &self.level
    }

    pub fn level_number(&self) -> u32 {
        self.level.number()
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    /// Cache identity.
    pub fn key(&self) -> &TileKey {
        &self.key
    }

    /// Relative cache/storage path, derived from the key.
    pub fn path(&self) -> String {
        self.key.cache_path(self.level.suffix())
    }

    /// The tile's own resource locator, built from the level's service template.
    pub fn resource_url(&self, format: &str) -> Result<Url, url::ParseError> {
        let raw = expand_template(self.level.service(), &self.level, self.row, self.col, format);
        Url::parse(&raw)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.level.dataset(),
            self.level.number(),
            self.row,
            self.col
        )
    }
}
