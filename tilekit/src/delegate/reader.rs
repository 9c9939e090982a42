//! `ImageReader()`: decodes local tile files with the `image` crate.

use std::sync::Arc;

use image::RgbaImage;
use tracing::debug;
use url::Url;

use super::definition::Definition;
use super::error::DecodeError;
use super::registry::{DelegateContext, DelegateType};
use super::traits::{Capabilities, Delegate, TileReader};
use crate::tile::Tile;

/// Decodes any format the `image` crate recognizes into RGBA.
///
/// A missing file is not an error: the reader returns `None` so the next
/// reader in the chain, or a retrieval, can take over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageReader;

impl ImageReader {
    pub const NAME: &'static str = "ImageReader";

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        (def.is(Self::NAME) && def.args().is_empty()).then_some(Self)
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }
}

impl Delegate for ImageReader {
    fn to_definition(&self) -> String {
        format!("{}()", Self::NAME)
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_tile_reader(self)
    }
}

impl TileReader for ImageReader {
    fn read_image(&self, tile: &Tile, url: &Url) -> Result<Option<RgbaImage>, DecodeError> {
        if url.scheme() != "file" {
            return Err(DecodeError::NotAFileUrl(url.to_string()));
        }
        let path = url
            .to_file_path()
            .map_err(|_| DecodeError::NotAFileUrl(url.to_string()))?;

        if !path.is_file() {
            debug!(tile = %tile, path = %path.display(), "No local file for tile");
            return Ok(None);
        }

        let bytes = std::fs::read(&path).map_err(|source| DecodeError::Io {
            path: path.clone(),
            source,
        })?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();

        debug!(
            tile = %tile,
            width = image.width(),
            height = image.height(),
            "Decoded tile"
        );
        Ok(Some(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Level;
    use image::Rgba;

    fn tile() -> Tile {
        let level = Arc::new(Level::new(0, "t", "file:///unused", "image/png", 4, 36.0));
        Tile::new(level.tile_sector(0, 0), level, 0, 0)
    }

    #[test]
    fn test_reads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.png");
        RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let image = ImageReader
            .read_image(&tile(), &Url::from_file_path(&path).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(image.get_pixel(1, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("absent.png")).unwrap();
        assert!(ImageReader.read_image(&tile(), &url).unwrap().is_none());
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not an image").unwrap();
        let result = ImageReader.read_image(&tile(), &Url::from_file_path(&path).unwrap());
        assert!(matches!(result, Err(DecodeError::Image(_))));
    }

    #[test]
    fn test_remote_url_rejected() {
        let url = Url::parse("https://example.com/t.png").unwrap();
        assert!(matches!(
            ImageReader.read_image(&tile(), &url),
            Err(DecodeError::NotAFileUrl(_))
        ));
    }
}
