//! Level and sector types describing a layer's tile grid.
//!
//! The grid follows the usual virtual-globe convention: the origin is the
//! south-west corner (-90°, -180°), rows increase northward and columns
//! increase eastward. At level `n` each tile spans
//! `level_zero_tile_delta / 2^n` degrees in both directions.

use std::sync::Arc;

/// Default level-zero tile size in degrees.
pub const DEFAULT_LEVEL_ZERO_TILE_DELTA: f64 = 36.0;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// Geographic bounds in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Sector {
    /// Create a sector from its bounds.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// The whole globe.
    pub fn full_sphere() -> Self {
        Self::new(-90.0, 90.0, -180.0, 180.0)
    }

    /// Latitude span in degrees.
    pub fn delta_lat(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude span in degrees.
    pub fn delta_lon(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

/// One level of a layer's tile pyramid.
///
/// Carries everything needed to address a tile at this level: the dataset
/// (cache name), the service URL template the tile's own resource locator is
/// built from, the image format, and the grid geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    number: u32,
    dataset: Arc<str>,
    service: Arc<str>,
    format: Arc<str>,
    tile_size: u32,
    tile_delta: f64,
}

impl Level {
    /// Create a level.
    ///
    /// # Arguments
    ///
    /// * `number` - Level number (0 is the coarsest)
    /// * `dataset` - Dataset / cache name shared by all levels of a layer
    /// * `service` - URL template for the tile's own locator (see [`expand_template`])
    /// * `format` - Image MIME type, e.g. `image/png`
    /// * `tile_size` - Tile edge length in pixels
    /// * `tile_delta` - Tile edge length in degrees at this level
    pub fn new(
        number: u32,
        dataset: impl Into<Arc<str>>,
        service: impl Into<Arc<str>>,
        format: impl Into<Arc<str>>,
        tile_size: u32,
        tile_delta: f64,
    ) -> Self {
        Self {
            number,
            dataset: dataset.into(),
            service: service.into(),
            format: format.into(),
            tile_size,
            tile_delta,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// File suffix (with leading dot) for this level's format.
    pub fn suffix(&self) -> &'static str {
        format_suffix(&self.format)
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Tile edge length in degrees.
    pub fn tile_delta(&self) -> f64 {
        self.tile_delta
    }

    /// Number of tile rows covering -90°..90°.
    pub fn row_count(&self) -> u32 {
        grid_count(180.0, self.tile_delta)
    }

    /// Number of tile columns covering -180°..180°.
    pub fn col_count(&self) -> u32 {
        grid_count(360.0, self.tile_delta)
    }

    /// Whether `(row, col)` lies inside this level's grid.
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.row_count() && col < self.col_count()
    }

    /// Geographic bounds of the tile at `(row, col)`.
    pub fn tile_sector(&self, row: u32, col: u32) -> Sector {
        let min_lat = -90.0 + row as f64 * self.tile_delta;
        let min_lon = -180.0 + col as f64 * self.tile_delta;
        Sector::new(
            min_lat,
            (min_lat + self.tile_delta).min(90.0),
            min_lon,
            (min_lon + self.tile_delta).min(180.0),
        )
    }
}

/// Number of rows at `level` for a pyramid with the given level-zero delta.
pub fn rows_at_level(level_zero_tile_delta: f64, level: u32) -> u32 {
    grid_count(180.0, level_zero_tile_delta / 2f64.powi(level as i32))
}

fn grid_count(span: f64, delta: f64) -> u32 {
    if delta <= 0.0 {
        return 0;
    }
    // Guard against 180/36 = 4.999999 style rounding before taking the ceiling
    let raw = span / delta;
    let rounded = raw.round();
    if (raw - rounded).abs() < 1e-9 {
        rounded as u32
    } else {
        raw.ceil() as u32
    }
}

/// The ordered levels of a tiled layer.
#[derive(Debug, Clone)]
pub struct LevelSet {
    levels: Vec<Arc<Level>>,
}

impl LevelSet {
    /// Build `count` levels, halving the tile delta at every level.
    pub fn new(
        dataset: &str,
        service: &str,
        format: &str,
        count: u32,
        level_zero_tile_delta: f64,
        tile_size: u32,
    ) -> Self {
        let dataset: Arc<str> = Arc::from(dataset);
        let service: Arc<str> = Arc::from(service);
        let format: Arc<str> = Arc::from(format);

        let levels = (0..count)
            .map(|n| {
                Arc::new(Level::new(
                    n,
                    Arc::clone(&dataset),
                    Arc::clone(&service),
                    Arc::clone(&format),
                    tile_size,
                    level_zero_tile_delta / 2f64.powi(n as i32),
                ))
            })
            .collect();

        Self { levels }
    }

    /// Level by number.
    pub fn level(&self, number: u32) -> Option<&Arc<Level>> {
        self.levels.get(number as usize)
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true if there are no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterate levels from coarsest to finest.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Level>> {
        self.levels.iter()
    }
}

/// File suffix (with leading dot) for an image MIME type.
///
/// Unknown types fall back to `.bin`.
pub fn format_suffix(format: &str) -> &'static str {
    match format.trim().to_ascii_lowercase().as_str() {
        "image/png" => ".png",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tif",
        "image/webp" => ".webp",
        "application/zip" | "application/x-zip-compressed" => ".zip",
        _ => ".bin",
    }
}

/// Expand a tile URL template.
///
/// Placeholders:
/// - `{z}` level number
/// - `{x}` column
/// - `{y}` row (counted from the south)
/// - `{-y}` row counted from the north (`row_count - 1 - row`)
/// - `{ext}` file extension for `format`, without the dot
/// - `{dataset}` dataset name
pub fn expand_template(template: &str, level: &Level, row: u32, col: u32, format: &str) -> String {
    let flipped = level.row_count().saturating_sub(1).saturating_sub(row);
    let ext = format_suffix(format).trim_start_matches('.');

    template
        .replace("{z}", &level.number().to_string())
        .replace("{x}", &col.to_string())
        .replace("{-y}", &flipped.to_string())
        .replace("{y}", &row.to_string())
        .replace("{ext}", ext)
        .replace("{dataset}", level.dataset())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(number: u32) -> Level {
        Level::new(
            number,
            "bmng",
            "https://tiles.example.com/{dataset}/{z}/{y}/{x}.{ext}",
            "image/png",
            512,
            DEFAULT_LEVEL_ZERO_TILE_DELTA / 2f64.powi(number as i32),
        )
    }

    #[test]
    fn test_grid_dimensions() {
        assert_eq!(level(0).row_count(), 5);
        assert_eq!(level(0).col_count(), 10);
        assert_eq!(level(2).row_count(), 20);
        assert_eq!(level(2).col_count(), 40);
    }

    #[test]
    fn test_rows_at_level_matches_level() {
        for n in 0..8 {
            assert_eq!(rows_at_level(36.0, n), level(n).row_count());
        }
    }

    #[test]
    fn test_tile_sector() {
        let sector = level(0).tile_sector(1, 2);
        assert_eq!(sector.min_lat, -54.0);
        assert_eq!(sector.max_lat, -18.0);
        assert_eq!(sector.min_lon, -108.0);
        assert_eq!(sector.max_lon, -72.0);
    }

    #[test]
    fn test_contains() {
        let l = level(0);
        assert!(l.contains(4, 9));
        assert!(!l.contains(5, 0));
        assert!(!l.contains(0, 10));
    }

    #[test]
    fn test_expand_template() {
        let l = level(2);
        let url = expand_template(l.service(), &l, 3, 7, "image/png");
        assert_eq!(url, "https://tiles.example.com/bmng/2/3/7.png");
    }

    #[test]
    fn test_expand_template_flipped_row() {
        let l = level(2);
        let url = expand_template("{z}/{-y}/{x}", &l, 3, 7, "image/jpeg");
        assert_eq!(url, "2/16/7");
    }

    #[test]
    fn test_format_suffix() {
        assert_eq!(format_suffix("image/png"), ".png");
        assert_eq!(format_suffix("IMAGE/JPEG"), ".jpg");
        assert_eq!(format_suffix("application/zip"), ".zip");
        assert_eq!(format_suffix("text/plain"), ".bin");
    }

    #[test]
    fn test_level_set() {
        let set = LevelSet::new("bmng", "file:///tiles/{z}/{y}/{x}.png", "image/png", 4, 36.0, 256);
        assert_eq!(set.len(), 4);
        assert_eq!(set.level(3).map(|l| l.tile_delta()), Some(4.5));
        assert!(set.level(4).is_none());
    }
}
