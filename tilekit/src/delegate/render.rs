//! Render delegates: GPU state changes around the tile draw call.
//!
//! Each delegate saves the draw-context attributes in its pre hook, changes
//! one piece of state, and restores the attributes in its post hook.

use std::sync::Arc;

use super::definition::Definition;
use super::registry::{DelegateContext, DelegateType};
use super::traits::{Capabilities, Delegate, RenderDelegate};
use crate::render::{ColorMask, DrawContext, TextureFilter};

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// `NearestNeighborRender()`: nearest-neighbour texture sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearestNeighborRender;

impl NearestNeighborRender {
    pub const NAME: &'static str = "NearestNeighborRender";

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        (def.is(Self::NAME) && def.args().is_empty()).then_some(Self)
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }
}

impl Delegate for NearestNeighborRender {
    fn to_definition(&self) -> String {
        format!("{}()", Self::NAME)
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_render(self)
    }
}

impl RenderDelegate for NearestNeighborRender {
    fn pre_render(&self, dc: &mut dyn DrawContext) {
        dc.push_attributes();
        dc.set_texture_filter(TextureFilter::Nearest);
    }

    fn post_render(&self, dc: &mut dyn DrawContext) {
        dc.pop_attributes();
    }
}

/// `ColorMaskRender(r,g,b,a)`: restrict colour writes; each flag is `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMaskRender {
    mask: ColorMask,
}

impl ColorMaskRender {
    pub const NAME: &'static str = "ColorMaskRender";

    pub fn new(mask: ColorMask) -> Self {
        Self { mask }
    }

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) || def.args().len() != 4 {
            return None;
        }
        Some(Self::new(ColorMask {
            red: def.bool_arg(0)?,
            green: def.bool_arg(1)?,
            blue: def.bool_arg(2)?,
            alpha: def.bool_arg(3)?,
        }))
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }
}

impl Delegate for ColorMaskRender {
    fn to_definition(&self) -> String {
        Definition::new(
            Self::NAME,
            [
                flag(self.mask.red),
                flag(self.mask.green),
                flag(self.mask.blue),
                flag(self.mask.alpha),
            ],
        )
        .to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_render(self)
    }
}

impl RenderDelegate for ColorMaskRender {
    fn pre_render(&self, dc: &mut dyn DrawContext) {
        dc.push_attributes();
        dc.set_color_mask(self.mask);
    }

    fn post_render(&self, dc: &mut dyn DrawContext) {
        dc.pop_attributes();
    }
}

/// `DepthTestRender(enabled)`: toggle depth testing for the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthTestRender {
    enabled: bool,
}

impl DepthTestRender {
    pub const NAME: &'static str = "DepthTestRender";

    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn from_definition(def: &Definition, _ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) || def.args().len() != 1 {
            return None;
        }
        Some(Self::new(def.bool_arg(0)?))
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }
}

impl Delegate for DepthTestRender {
    fn to_definition(&self) -> String {
        Definition::new(Self::NAME, [flag(self.enabled)]).to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_render(self)
    }
}

impl RenderDelegate for DepthTestRender {
    fn pre_render(&self, dc: &mut dyn DrawContext) {
        dc.push_attributes();
        dc.set_depth_test(self.enabled);
    }

    fn post_render(&self, dc: &mut dyn DrawContext) {
        dc.pop_attributes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{GlStateContext, RenderState};

    fn parse(s: &str) -> Definition {
        Definition::parse(s).unwrap()
    }

    #[test]
    fn test_nearest_neighbor_hooks() {
        let mut dc = GlStateContext::new();
        NearestNeighborRender.pre_render(&mut dc);
        assert_eq!(dc.state().texture_filter, TextureFilter::Nearest);
        NearestNeighborRender.post_render(&mut dc);
        assert_eq!(dc.state(), RenderState::default());
    }

    #[test]
    fn test_color_mask_definition() {
        let ctx = DelegateContext::default();
        let render = ColorMaskRender::from_definition(&parse("ColorMaskRender(1,0,true,0)"), &ctx).unwrap();
        assert_eq!(render.to_definition(), "ColorMaskRender(1,0,1,0)");

        let mut dc = GlStateContext::new();
        render.pre_render(&mut dc);
        assert!(!dc.state().color_mask.green);
        render.post_render(&mut dc);
        assert_eq!(dc.state().color_mask, ColorMask::ALL);

        assert!(ColorMaskRender::from_definition(&parse("ColorMaskRender(1,0,1)"), &ctx).is_none());
        assert!(ColorMaskRender::from_definition(&parse("ColorMaskRender(1,0,1,2)"), &ctx).is_none());
    }

    #[test]
    fn test_depth_test() {
        let ctx = DelegateContext::default();
        let render = DepthTestRender::from_definition(&parse("depthtestrender(false)"), &ctx).unwrap();
        assert_eq!(render.to_definition(), "DepthTestRender(0)");

        let mut dc = GlStateContext::new();
        render.pre_render(&mut dc);
        assert!(!dc.state().depth_test);
        render.post_render(&mut dc);
        assert!(dc.state().depth_test);
    }
}
