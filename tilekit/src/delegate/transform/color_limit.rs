use std::sync::Arc;

use image::RgbaImage;

use crate::delegate::definition::Definition;
use crate::delegate::registry::{DelegateContext, DelegateType};
use crate::delegate::traits::{Capabilities, Delegate, ImageTransformer};
use crate::tile::Tile;

/// `ColorLimitTransformer(r,g,b)`: clear pixels brighter than a ceiling in
/// any channel. Pixels within all ceilings are left as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorLimitTransformer {
    ceiling: [u8; 3],
}

impl ColorLimitTransformer {
    pub const NAME: &'static str = "ColorLimitTransformer";

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { ceiling: [r, g, b] }
    }

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) || def.args().len() != 3 {
            return None;
        }
        Some(Self::new(def.u8_arg(0)?, def.u8_arg(1)?, def.u8_arg(2)?))
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }
}

impl Delegate for ColorLimitTransformer {
    fn to_definition(&self) -> String {
        Definition::new(Self::NAME, self.ceiling.iter().map(|c| c.to_string())).to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_image_transformer(self)
    }
}

impl ImageTransformer for ColorLimitTransformer {
    fn transform(&self, image: &RgbaImage, _tile: Option<&Tile>) -> RgbaImage {
        let mut out = image.clone();
        for pixel in out.pixels_mut() {
            if (0..3).any(|i| pixel[i] > self.ceiling[i]) {
                pixel[3] = 0;
            }
        }
        out
    }
}
