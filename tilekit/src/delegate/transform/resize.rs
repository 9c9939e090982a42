use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::delegate::definition::Definition;
use crate::delegate::registry::{DelegateContext, DelegateType};
use crate::delegate::traits::{Capabilities, Delegate, ImageTransformer};
use crate::tile::Tile;

/// `ResizeTransformer(w,h)`: bilinear resample to exactly `w` x `h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTransformer {
    width: u32,
    height: u32,
}

impl ResizeTransformer {
    pub const NAME: &'static str = "ResizeTransformer";

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) || def.args().len() != 2 {
            return None;
        }
        let width = def.u32_arg(0).filter(|w| *w > 0)?;
        let height = def.u32_arg(1).filter(|h| *h > 0)?;
        Some(Self::new(width, height))
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }
}

impl Delegate for ResizeTransformer {
    fn to_definition(&self) -> String {
        Definition::new(Self::NAME, [self.width.to_string(), self.height.to_string()]).to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_image_transformer(self)
    }
}

impl ImageTransformer for ResizeTransformer {
    fn transform(&self, image: &RgbaImage, _tile: Option<&Tile>) -> RgbaImage {
        if image.dimensions() == (self.width, self.height) {
            return image.clone();
        }
        imageops::resize(image, self.width, self.height, FilterType::Triangle)
    }
}
