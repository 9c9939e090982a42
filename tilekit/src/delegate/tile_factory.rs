//! Tile factories: tile creation and cache-key mapping.

use std::sync::Arc;

use super::definition::Definition;
use super::registry::{DelegateContext, DelegateType};
use super::traits::{Capabilities, Delegate, TileFactory};
use crate::tile::{rows_at_level, Level, Sector, Tile, TileKey};

/// `TextureTileFactory()`: plain tiles keyed by their raw address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureTileFactory;

impl TextureTileFactory {
    pub const NAME: &'static str = "TextureTileFactory";

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        (def.is(Self::NAME) && def.args().is_empty()).then_some(Self)
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }
}

impl Delegate for TextureTileFactory {
    fn to_definition(&self) -> String {
        format!("{}()", Self::NAME)
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_tile_factory(self)
    }
}

impl TileFactory for TextureTileFactory {
    fn create_texture_tile(&self, sector: Sector, level: &Arc<Level>, row: u32, col: u32) -> Tile {
        Tile::new(sector, Arc::clone(level), row, col)
    }

    fn transform_tile_key(&self, key: &TileKey, _level: &Level) -> TileKey {
        key.clone()
    }
}

/// `FlippedRowTileFactory()` / `FlippedRowTileFactory(delta)`.
///
/// For servers that count rows from the north. The key's row is flipped
/// within the level grid so these tiles land on the same cache entries as
/// tiles addressed from the south. Rows are counted on the tile's own level
/// unless `delta` gives the level-zero tile size in degrees to flip against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlippedRowTileFactory {
    level_zero_tile_delta: Option<f64>,
}

impl FlippedRowTileFactory {
    pub const NAME: &'static str = "FlippedRowTileFactory";

    pub fn new(level_zero_tile_delta: Option<f64>) -> Self {
        Self {
            level_zero_tile_delta,
        }
    }

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) {
            return None;
        }
        match def.args().len() {
            0 => Some(Self::new(None)),
            1 => def
                .f64_arg(0)
                .filter(|delta| *delta > 0.0)
                .map(|delta| Self::new(Some(delta))),
            _ => None,
        }
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }

    /// Level-zero delta overriding the level's own grid, if configured.
    pub fn level_zero_tile_delta(&self) -> Option<f64> {
        self.level_zero_tile_delta
    }
}

impl Delegate for FlippedRowTileFactory {
    fn to_definition(&self) -> String {
        Definition::new(
            Self::NAME,
            self.level_zero_tile_delta.iter().map(|d| d.to_string()),
        )
        .to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_tile_factory(self)
    }
}

impl TileFactory for FlippedRowTileFactory {
    fn create_texture_tile(&self, sector: Sector, level: &Arc<Level>, row: u32, col: u32) -> Tile {
        let tile = Tile::new(sector, Arc::clone(level), row, col);
        let key = self.transform_tile_key(tile.key(), level);
        tile.with_key(key)
    }

    fn transform_tile_key(&self, key: &TileKey, level: &Level) -> TileKey {
        let rows = match self.level_zero_tile_delta {
            Some(delta) => rows_at_level(delta, key.level()),
            None => level.row_count(),
        };
        key.with_row(rows.saturating_sub(1).saturating_sub(key.row()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(number: u32, level_zero_delta: f64) -> Arc<Level> {
        Arc::new(Level::new(
            number,
            "osm",
            "http://tiles.test/{z}/{x}/{y}.png",
            "image/png",
            256,
            level_zero_delta / 2f64.powi(number as i32),
        ))
    }

    #[test]
    fn test_texture_factory_identity() {
        let l = level(1, 36.0);
        let tile = TextureTileFactory.create_texture_tile(l.tile_sector(3, 4), &l, 3, 4);
        assert_eq!(tile.key(), &TileKey::new("osm", 1, 3, 4));
        assert_eq!(
            TextureTileFactory.transform_tile_key(tile.key(), &l),
            TileKey::new("osm", 1, 3, 4)
        );
    }

    #[test]
    fn test_flipped_key() {
        let factory = FlippedRowTileFactory::new(None);
        let l = level(1, 36.0);
        // Level 1 has 10 rows
        assert_eq!(
            factory.transform_tile_key(&TileKey::new("osm", 1, 0, 4), &l),
            TileKey::new("osm", 1, 9, 4)
        );

        let tile = factory.create_texture_tile(l.tile_sector(2, 4), &l, 2, 4);
        assert_eq!(tile.row(), 2);
        assert_eq!(tile.key().row(), 7);
        assert_eq!(tile.path(), "osm/1/7/7_4.png");
    }

    #[test]
    fn test_flip_follows_level_grid() {
        let factory = FlippedRowTileFactory::new(None);

        // 45 degree tiles: level 0 has 4 rows, level 2 has 16
        let l0 = level(0, 45.0);
        assert_eq!(l0.row_count(), 4);
        let tile = factory.create_texture_tile(l0.tile_sector(0, 0), &l0, 0, 0);
        assert_eq!(tile.key(), &TileKey::new("osm", 0, 3, 0));
        assert!(l0.contains(tile.key().row(), 0));

        let l2 = level(2, 45.0);
        assert_eq!(
            factory.transform_tile_key(&TileKey::new("osm", 2, 1, 5), &l2),
            TileKey::new("osm", 2, 14, 5)
        );
    }

    #[test]
    fn test_explicit_delta_overrides_level() {
        let factory = FlippedRowTileFactory::new(Some(36.0));
        let l0 = level(0, 45.0);
        // Flipped against the 5-row 36 degree grid, not the layer's 4 rows
        assert_eq!(
            factory.transform_tile_key(&TileKey::new("osm", 0, 0, 0), &l0),
            TileKey::new("osm", 0, 4, 0)
        );
    }

    #[test]
    fn test_flip_is_involution() {
        let l = level(3, 45.0);
        for factory in [FlippedRowTileFactory::new(None), FlippedRowTileFactory::new(Some(45.0))] {
            let key = TileKey::new("x", 3, 5, 6);
            assert_eq!(
                factory.transform_tile_key(&factory.transform_tile_key(&key, &l), &l),
                key
            );
        }
    }

    #[test]
    fn test_definitions() {
        let ctx = DelegateContext::default();
        let parse = |s: &str| FlippedRowTileFactory::from_definition(&Definition::parse(s).unwrap(), &ctx);

        assert_eq!(parse("FlippedRowTileFactory").unwrap().to_definition(), "FlippedRowTileFactory()");
        assert_eq!(parse("FlippedRowTileFactory").unwrap().level_zero_tile_delta(), None);
        assert_eq!(parse("FlippedRowTileFactory(22.5)").unwrap().to_definition(), "FlippedRowTileFactory(22.5)");
        assert_eq!(parse("FlippedRowTileFactory(36.0)").unwrap().to_definition(), "FlippedRowTileFactory(36)");
        assert!(parse("FlippedRowTileFactory(0)").is_none());
        assert!(parse("FlippedRowTileFactory(a)").is_none());
    }
}
