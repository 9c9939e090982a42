//! Cache identity for a tile.

use std::fmt;
use std::sync::Arc;

/// Canonical cache-addressing identity for a tile.
///
/// A key starts out as the tile's raw `(dataset, level, row, col)` address,
/// but a [`TileFactory`](crate::delegate::TileFactory) may remap it so that
/// tiles from servers with different addressing schemes share one cache
/// layout. Caches, file stores, and in-flight tracking all go through the
/// key, never through the raw triple.
///
/// # Example
///
/// ```
/// use tilekit::tile::TileKey;
///
/// let key = TileKey::new("bmng", 3, 12, 40);
/// assert_eq!(key.to_string(), "bmng/3/12/40");
/// assert_eq!(key.with_row(7).row(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    dataset: Arc<str>,
    level: u32,
    row: u32,
    col: u32,
}

impl TileKey {
    /// Create a new tile key.
    pub fn new(dataset: impl Into<Arc<str>>, level: u32, row: u32, col: u32) -> Self {
        Self {
            dataset: dataset.into(),
            level,
            row,
            col,
        }
    }

    /// Dataset (cache name) this key belongs to.
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Level number.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Row within the level grid.
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Column within the level grid.
    pub fn col(&self) -> u32 {
        self.col
    }

    /// Copy of this key with a different row.
    pub fn with_row(&self, row: u32) -> Self {
        Self {
            row,
            ..self.clone()
        }
    }

    /// Copy of this key with a different column.
    pub fn with_col(&self, col: u32) -> Self {
        Self {
            col,
            ..self.clone()
        }
    }

    /// Relative path of the cached file for this key.
    ///
    /// Format: `{dataset}/{level}/{row}/{row}_{col}{suffix}`
    pub fn cache_path(&self, suffix: &str) -> String {
        format!(
            "{}/{}/{}/{}_{}{}",
            self.dataset, self.level, self.row, self.row, self.col, suffix
        )
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.dataset, self.level, self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_accessors() {
        let key = TileKey::new("bmng", 4, 10, 20);
        assert_eq!(key.dataset(), "bmng");
        assert_eq!(key.level(), 4);
        assert_eq!(key.row(), 10);
        assert_eq!(key.col(), 20);
    }

    #[test]
    fn test_cache_path() {
        let key = TileKey::new("bmng", 4, 10, 20);
        assert_eq!(key.cache_path(".png"), "bmng/4/10/10_20.png");
    }

    #[test]
    fn test_equal_keys_hash_together() {
        let mut set = HashSet::new();
        set.insert(TileKey::new("a", 1, 2, 3));
        set.insert(TileKey::new("a", 1, 2, 3));
        set.insert(TileKey::new("b", 1, 2, 3));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_with_row_and_col() {
        let key = TileKey::new("a", 1, 2, 3);
        let moved = key.with_row(9).with_col(8);
        assert_eq!(moved, TileKey::new("a", 1, 9, 8));
        assert_eq!(key.row(), 2);
    }
}
