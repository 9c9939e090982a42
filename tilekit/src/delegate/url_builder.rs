//! `UrlTemplate(template)`: builds tile URLs from a template.

use std::sync::Arc;

use url::Url;

use super::definition::Definition;
use super::registry::{DelegateContext, DelegateType};
use super::traits::{Capabilities, Delegate, TileUrlBuilder};
use crate::tile::{expand_template, Tile};

/// Substitutes `{z}`, `{x}`, `{y}`, `{-y}`, `{ext}` and `{dataset}` into a
/// URL template. `{-y}` is the row counted from the top of the level grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub const NAME: &'static str = "UrlTemplate";

    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) {
            return None;
        }
        match def.args() {
            [template] => Some(Self::new(template.clone())),
            _ => None,
        }
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl Delegate for UrlTemplate {
    fn to_definition(&self) -> String {
        Definition::new(Self::NAME, [self.template.as_str()]).to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_url_builder(self)
    }
}

impl TileUrlBuilder for UrlTemplate {
    fn build_url(&self, tile: &Tile, format: &str) -> Result<Url, url::ParseError> {
        Url::parse(&expand_template(
            &self.template,
            tile.level(),
            tile.row(),
            tile.col(),
            format,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Level;

    fn tile(row: u32, col: u32) -> Tile {
        let level = Arc::new(Level::new(3, "osm", "file:///unused", "image/png", 256, 4.5));
        Tile::new(level.tile_sector(row, col), level, row, col)
    }

    #[test]
    fn test_build_url() {
        let builder = UrlTemplate::new("https://a.tile.example.org/{z}/{x}/{-y}.{ext}");
        let url = builder.build_url(&tile(0, 5), "image/png").unwrap();
        // Level 3 at 4.5 degrees has 40 rows
        assert_eq!(url.as_str(), "https://a.tile.example.org/3/5/39.png");
    }

    #[test]
    fn test_definition_round_trip() {
        let ctx = DelegateContext::default();
        let def = Definition::parse("UrlTemplate(https://t.example.com/{z}/{y}/{x}.jpg)").unwrap();
        let builder = UrlTemplate::from_definition(&def, &ctx).unwrap();
        assert_eq!(builder.to_definition(), "UrlTemplate(https://t.example.com/{z}/{y}/{x}.jpg)");
    }

    #[test]
    fn test_requires_one_argument() {
        let ctx = DelegateContext::default();
        assert!(UrlTemplate::from_definition(&Definition::parse("UrlTemplate()").unwrap(), &ctx).is_none());
    }

    #[test]
    fn test_invalid_url_is_error() {
        let builder = UrlTemplate::new("not a url {z}");
        assert!(builder.build_url(&tile(0, 0), "image/png").is_err());
    }
}
