use std::sync::Arc;

use image::RgbaImage;
use rayon::prelude::*;

use crate::delegate::definition::Definition;
use crate::delegate::registry::{DelegateContext, DelegateType};
use crate::delegate::traits::{Capabilities, Delegate, ImageTransformer};
use crate::tile::Tile;

use super::box_average;

/// `StripingFilterTransformer(low,high)`: suppress sensor striping.
///
/// Each colour plane is mapped to `[-1, 1]`, then the output is
/// `low_pass(low) + original - low_pass(high)`: detail finer than the `high`
/// window is kept, the band between the two windows is replaced by its
/// smoothed form. Alpha passes through unchanged. A uniform image comes back
/// exactly as it went in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripingFilterTransformer {
    low_window: u32,
    high_window: u32,
}

impl StripingFilterTransformer {
    pub const NAME: &'static str = "StripingFilterTransformer";

    pub fn new(low_window: u32, high_window: u32) -> Self {
        Self {
            low_window: low_window.max(1),
            high_window: high_window.max(1),
        }
    }

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) || def.args().len() != 2 {
            return None;
        }
        let low = def.u32_arg(0).filter(|v| *v >= 1)?;
        let high = def.u32_arg(1).filter(|v| *v >= 1)?;
        Some(Self::new(low, high))
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }

    fn filter_plane(&self, plane: &[f32], width: usize, height: usize) -> Vec<f32> {
        let low_radius = (self.low_window / 2) as usize;
        let high_radius = (self.high_window / 2) as usize;
        let low = box_average(plane, width, height, low_radius, low_radius);
        let high = box_average(plane, width, height, high_radius, high_radius);

        plane
            .iter()
            .zip(low.iter().zip(&high))
            .map(|(&orig, (&l, &h))| (l + orig - h).clamp(-1.0, 1.0))
            .collect()
    }
}

fn to_signed(v: u8) -> f32 {
    v as f32 / 127.5 - 1.0
}

fn to_byte(v: f32) -> u8 {
    ((v + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}

impl Delegate for StripingFilterTransformer {
    fn to_definition(&self) -> String {
        Definition::new(
            Self::NAME,
            [self.low_window.to_string(), self.high_window.to_string()],
        )
        .to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_image_transformer(self)
    }
}

impl ImageTransformer for StripingFilterTransformer {
    fn transform(&self, image: &RgbaImage, _tile: Option<&Tile>) -> RgbaImage {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return image.clone();
        }

        let planes: Vec<Vec<f32>> = (0..3usize)
            .into_par_iter()
            .map(|channel| {
                let plane: Vec<f32> = image.pixels().map(|p| to_signed(p[channel])).collect();
                self.filter_plane(&plane, w, h)
            })
            .collect();

        let mut out = image.clone();
        for (i, pixel) in out.pixels_mut().enumerate() {
            for (channel, plane) in planes.iter().enumerate() {
                pixel[channel] = to_byte(plane[i]);
            }
        }
        out
    }
}
