use std::sync::Arc;

use image::RgbaImage;

use crate::delegate::definition::Definition;
use crate::delegate::registry::{DelegateContext, DelegateType};
use crate::delegate::traits::{Capabilities, Delegate, ImageTransformer};
use crate::tile::Tile;

/// `TransparentColorTransformer(r,g,b,fuzz)`: clear pixels near a colour.
///
/// `fuzz` is a fraction of the channel range; a pixel whose channels are all
/// within `fuzz * 255` of the target gets alpha 0, its colour kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransparentColorTransformer {
    target: [u8; 3],
    fuzz: f64,
}

impl TransparentColorTransformer {
    pub const NAME: &'static str = "TransparentColorTransformer";

    pub fn new(r: u8, g: u8, b: u8, fuzz: f64) -> Self {
        Self {
            target: [r, g, b],
            fuzz,
        }
    }

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) || def.args().len() != 4 {
            return None;
        }
        Some(Self::new(
            def.u8_arg(0)?,
            def.u8_arg(1)?,
            def.u8_arg(2)?,
            def.f64_arg(3)?,
        ))
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }

    /// Per-channel tolerance in 0..=255.
    pub fn tolerance(&self) -> i32 {
        (self.fuzz * 255.0).clamp(0.0, 255.0).round() as i32
    }
}

impl Delegate for TransparentColorTransformer {
    fn to_definition(&self) -> String {
        let [r, g, b] = self.target;
        Definition::new(
            Self::NAME,
            [
                r.to_string(),
                g.to_string(),
                b.to_string(),
                self.fuzz.to_string(),
            ],
        )
        .to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_image_transformer(self)
    }
}

impl ImageTransformer for TransparentColorTransformer {
    fn transform(&self, image: &RgbaImage, _tile: Option<&Tile>) -> RgbaImage {
        let tolerance = self.tolerance();
        let mut out = image.clone();
        for pixel in out.pixels_mut() {
            let near = (0..3).all(|i| (pixel[i] as i32 - self.target[i] as i32).abs() <= tolerance);
            if near {
                pixel[3] = 0;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_fuzz_boundary_inclusive() {
        let mut image = RgbaImage::new(3, 1);
        image.put_pixel(0, 0, Rgba([100, 100, 100, 255]));
        image.put_pixel(1, 0, Rgba([110, 90, 100, 255]));
        image.put_pixel(2, 0, Rgba([111, 100, 100, 255]));

        // 10/255 of the range
        let out = TransparentColorTransformer::new(100, 100, 100, 10.0 / 255.0).transform(&image, None);
        assert_eq!(out.get_pixel(0, 0), &Rgba([100, 100, 100, 0]));
        assert_eq!(out.get_pixel(1, 0), &Rgba([110, 90, 100, 0]));
        assert_eq!(out.get_pixel(2, 0), &Rgba([111, 100, 100, 255]));
    }

    #[test]
    fn test_fuzz_clamped() {
        assert_eq!(TransparentColorTransformer::new(0, 0, 0, 3.0).tolerance(), 255);
        assert_eq!(TransparentColorTransformer::new(0, 0, 0, -1.0).tolerance(), 0);
    }

    #[test]
    fn test_zero_fuzz_exact_match() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255]));
        let out = TransparentColorTransformer::new(1, 2, 4, 0.0).transform(&image, None);
        assert_eq!(out.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn test_definition() {
        let ctx = DelegateContext::default();
        let parse = |s: &str| TransparentColorTransformer::from_definition(&Definition::parse(s).unwrap(), &ctx);
        assert_eq!(
            parse("TransparentColorTransformer(0,0,0,0.05)").unwrap().to_definition(),
            "TransparentColorTransformer(0,0,0,0.05)"
        );
        assert!(parse("TransparentColorTransformer(0,0,0)").is_none());
        assert!(parse("TransparentColorTransformer(0,0,0,x)").is_none());
    }
}
