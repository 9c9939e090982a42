use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::delegate::definition::Definition;
use crate::delegate::registry::{DelegateContext, DelegateType};
use crate::delegate::traits::{Capabilities, Delegate, ImageTransformer};
use crate::tile::Tile;

/// `ColorToAlphaTransformer(r,g,b)`: turn a colour into transparency.
///
/// Each pixel's alpha is scaled by its largest per-channel distance from the
/// target, measured relative to how far that channel could be from it.
/// The colour is then re-derived so that compositing the result over the
/// target colour reproduces the original pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorToAlphaTransformer {
    target: [u8; 3],
}

impl ColorToAlphaTransformer {
    pub const NAME: &'static str = "ColorToAlphaTransformer";

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { target: [r, g, b] }
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

    fn convert(&self, pixel: &Rgba<u8>) -> Rgba<u8> {
        let target = self.target.map(|c| c as f32 / 255.0);
        let color = [pixel[0], pixel[1], pixel[2]].map(|c| c as f32 / 255.0);

        let distance = color
            .iter()
            .zip(&target)
            .map(|(&c, &t)| channel_distance(c, t))
            .fold(0.0f32, f32::max);

        if distance <= 0.0 {
            return Rgba([pixel[0], pixel[1], pixel[2], 0]);
        }

        let mut out = [0u8; 4];
        for i in 0..3 {
            let c = (color[i] - target[i]) / distance + target[i];
            out[i] = to_byte(c);
        }
        out[3] = to_byte(pixel[3] as f32 / 255.0 * distance);
        Rgba(out)
    }
}

fn channel_distance(c: f32, t: f32) -> f32 {
    if c > t {
        if t < 1.0 {
            (c - t) / (1.0 - t)
        } else {
            0.0
        }
    } else if c < t {
        if t > 0.0 {
            (t - c) / t
        } else {
            0.0
        }
    } else {
        0.0
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Delegate for ColorToAlphaTransformer {
    fn to_definition(&self) -> String {
        Definition::new(Self::NAME, self.target.iter().map(|c| c.to_string())).to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_image_transformer(self)
    }
}

impl ImageTransformer for ColorToAlphaTransformer {
    fn transform(&self, image: &RgbaImage, _tile: Option<&Tile>) -> RgbaImage {
        let mut out = image.clone();
        for pixel in out.pixels_mut() {
            *pixel = self.convert(pixel);
        }
        out
    }
}
