use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use tracing::warn;

use crate::delegate::definition::Definition;
use crate::delegate::registry::{DelegateContext, DelegateType};
use crate::delegate::traits::{Capabilities, Delegate, ImageTransformer};
use crate::tile::Tile;

use super::box_average;

/// Namespaces searched when resolving an operator name, in order.
pub const FILTER_NAMESPACES: [&str; 2] = ["color", "blur"];

/// A named in-place pixel operator configured through string properties.
pub trait PixelFilter: Send + Sync + fmt::Debug {
    /// Assign a property. Returns `false` when the name is unknown or the
    /// value does not parse.
    fn set_property(&mut self, name: &str, value: &str) -> bool;

    fn apply(&self, image: &mut RgbaImage);
}

fn lookup(namespace: &str, name: &str) -> Option<Box<dyn PixelFilter>> {
    let filter: Box<dyn PixelFilter> = match (namespace, name.to_ascii_lowercase().as_str()) {
        ("color", "invert") => Box::new(Invert),
        ("color", "grayscale") => Box::new(Grayscale),
        ("color", "gamma") => Box::new(Gamma { gamma: 1.0 }),
        ("color", "contrast") => Box::new(Contrast {
            brightness: 1.0,
            contrast: 1.0,
        }),
        ("blur", "boxblur") => Box::new(BoxBlur {
            h_radius: 2,
            v_radius: 2,
        }),
        _ => return None,
    };
    Some(filter)
}

/// Resolve `name` or `namespace.name` against [`FILTER_NAMESPACES`].
pub(crate) fn resolve(name: &str) -> Option<Box<dyn PixelFilter>> {
    match name.split_once('.') {
        Some((namespace, simple)) => FILTER_NAMESPACES
            .iter()
            .find(|ns| ns.eq_ignore_ascii_case(namespace))
            .and_then(|ns| lookup(ns, simple)),
        None => FILTER_NAMESPACES.iter().find_map(|ns| lookup(ns, name)),
    }
}

/// `FilterTransformer(op,op,...)`: an ordered chain of pixel operators.
///
/// Each op is a nested definition whose arguments are `name=value`
/// property assignments, e.g. `Gamma(gamma=0.8)`. The raw op strings are
/// kept so the definition serializes back the way it was written.
#[derive(Debug)]
pub struct FilterTransformer {
    ops: Vec<String>,
    filters: Vec<Box<dyn PixelFilter>>,
}

impl FilterTransformer {
    pub const NAME: &'static str = "FilterTransformer";

    pub fn new<I, S>(ops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ops: Vec<String> = ops.into_iter().map(Into::into).collect();
        let filters = ops.iter().filter_map(|op| build_filter(op)).collect();
        Self { ops, filters }
    }

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) {
            return None;
        }
        Some(Self::new(def.args().iter().cloned()))
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }

    /// Number of operators that resolved.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

fn build_filter(op: &str) -> Option<Box<dyn PixelFilter>> {
    let def = match Definition::parse(op) {
        Ok(def) => def,
        Err(e) => {
            warn!(op = %op, error = %e, "Skipping malformed filter operator");
            return None;
        }
    };

    let Some(mut filter) = resolve(def.name()) else {
        warn!(op = %def.name(), "Skipping unknown filter operator");
        return None;
    };

    for assignment in def.args() {
        let accepted = assignment
            .split_once('=')
            .map(|(k, v)| filter.set_property(k.trim(), v.trim()))
            .unwrap_or(false);
        if !accepted {
            warn!(op = %def.name(), property = %assignment, "Ignoring filter property");
        }
    }
    Some(filter)
}

impl Delegate for FilterTransformer {
    fn to_definition(&self) -> String {
        Definition::new(Self::NAME, self.ops.iter().cloned()).to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_image_transformer(self)
    }
}

impl ImageTransformer for FilterTransformer {
    fn transform(&self, image: &RgbaImage, _tile: Option<&Tile>) -> RgbaImage {
        let mut out = image.clone();
        for filter in &self.filters {
            filter.apply(&mut out);
        }
        out
    }
}

// =============================================================================
// Operators
// =============================================================================

fn map_rgb(image: &mut RgbaImage, table: &[u8; 256]) {
    for pixel in image.pixels_mut() {
        for c in 0..3 {
            pixel[c] = table[pixel[c] as usize];
        }
    }
}

fn transfer_table(f: impl Fn(f64) -> f64) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = (f(i as f64 / 255.0) * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    table
}

#[derive(Debug)]
struct Invert;

impl PixelFilter for Invert {
    fn set_property(&mut self, _name: &str, _value: &str) -> bool {
        false
    }

    fn apply(&self, image: &mut RgbaImage) {
        for pixel in image.pixels_mut() {
            for c in 0..3 {
                pixel[c] = 255 - pixel[c];
            }
        }
    }
}

#[derive(Debug)]
struct Grayscale;

impl PixelFilter for Grayscale {
    fn set_property(&mut self, _name: &str, _value: &str) -> bool {
        false
    }

    fn apply(&self, image: &mut RgbaImage) {
        for pixel in image.pixels_mut() {
            let luma = (77 * pixel[0] as u32 + 151 * pixel[1] as u32 + 28 * pixel[2] as u32) >> 8;
            let luma = luma as u8;
            pixel[0] = luma;
            pixel[1] = luma;
            pixel[2] = luma;
        }
    }
}

#[derive(Debug)]
struct Gamma {
    gamma: f64,
}

impl PixelFilter for Gamma {
    fn set_property(&mut self, name: &str, value: &str) -> bool {
        match name {
            "gamma" => match value.parse::<f64>() {
                Ok(g) if g.is_finite() && g > 0.0 => {
                    self.gamma = g;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn apply(&self, image: &mut RgbaImage) {
        let exponent = 1.0 / self.gamma;
        map_rgb(image, &transfer_table(|f| f.powf(exponent)));
    }
}

#[derive(Debug)]
struct Contrast {
    brightness: f64,
    contrast: f64,
}

impl PixelFilter for Contrast {
    fn set_property(&mut self, name: &str, value: &str) -> bool {
        let Ok(v) = value.parse::<f64>() else {
            return false;
        };
        if !v.is_finite() || v < 0.0 {
            return false;
        }
        match name {
            "brightness" => self.brightness = v,
            "contrast" => self.contrast = v,
            _ => return false,
        }
        true
    }

    fn apply(&self, image: &mut RgbaImage) {
        let (brightness, contrast) = (self.brightness, self.contrast);
        map_rgb(
            image,
            &transfer_table(|f| (f * brightness - 0.5) * contrast + 0.5),
        );
    }
}

#[derive(Debug)]
struct BoxBlur {
    h_radius: usize,
    v_radius: usize,
}

impl PixelFilter for BoxBlur {
    fn set_property(&mut self, name: &str, value: &str) -> bool {
        let Ok(v) = value.parse::<usize>() else {
            return false;
        };
        match name {
            "hradius" => self.h_radius = v,
            "vradius" => self.v_radius = v,
            "radius" => {
                self.h_radius = v;
                self.v_radius = v;
            }
            _ => return false,
        }
        true
    }

    fn apply(&self, image: &mut RgbaImage) {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return;
        }
        for c in 0..4 {
            let plane: Vec<f32> = image.pixels().map(|p| p[c] as f32).collect();
            let blurred = box_average(&plane, w, h, self.h_radius, self.v_radius);
            for (pixel, v) in image.pixels_mut().zip(blurred) {
                pixel[c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
