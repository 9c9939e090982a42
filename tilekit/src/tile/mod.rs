//! Tile addressing: levels, sectors, tiles, and their cache keys.

mod key;
mod level;
mod texture;

pub use key::TileKey;
pub use level::{
    expand_template, format_suffix, rows_at_level, Level, LevelSet, Sector,
    DEFAULT_LEVEL_ZERO_TILE_DELTA, DEFAULT_TILE_SIZE,
};
pub use texture::Tile;
