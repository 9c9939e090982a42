//! Draw-context abstraction handed to render delegates.
//!
//! Render delegates never touch the GPU directly. They receive a
//! [`DrawContext`] around the tile draw call and change state through it,
//! bracketing their changes with an attribute push/pop so the state they
//! touched is restored regardless of the order post hooks run in.
//!
//! [`GlStateContext`] is an in-memory implementation that tracks the state a
//! real graphics context would hold. Hosts with an actual GPU backend
//! implement the trait over their own context.

use tracing::warn;

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

/// Per-channel colour write mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub alpha: bool,
}

impl ColorMask {
    pub const ALL: ColorMask = ColorMask {
        red: true,
        green: true,
        blue: true,
        alpha: true,
    };
}

impl Default for ColorMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Opaque draw-context handle passed to render hooks.
pub trait DrawContext {
    /// Save the current state on the attribute stack.
    fn push_attributes(&mut self);

    /// Restore the most recently saved state.
    fn pop_attributes(&mut self);

    fn set_texture_filter(&mut self, filter: TextureFilter);

    fn set_color_mask(&mut self, mask: ColorMask);

    fn set_depth_test(&mut self, enabled: bool);
}

/// Snapshot of the state tracked by [`GlStateContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub texture_filter: TextureFilter,
    pub color_mask: ColorMask,
    pub depth_test: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            texture_filter: TextureFilter::Linear,
            color_mask: ColorMask::ALL,
            depth_test: true,
        }
    }
}

/// In-memory draw context with an attribute stack.
#[derive(Debug, Default)]
pub struct GlStateContext {
    state: RenderState,
    stack: Vec<RenderState>,
}

impl GlStateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Depth of the attribute stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl DrawContext for GlStateContext {
    fn push_attributes(&mut self) {
        self.stack.push(self.state);
    }

    fn pop_attributes(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => warn!("Attribute stack underflow, state left unchanged"),
        }
    }

    fn set_texture_filter(&mut self, filter: TextureFilter) {
        self.state.texture_filter = filter;
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        self.state.color_mask = mask;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_restores_state() {
        let mut dc = GlStateContext::new();
        dc.push_attributes();
        dc.set_texture_filter(TextureFilter::Nearest);
        dc.set_depth_test(false);
        assert_eq!(dc.state().texture_filter, TextureFilter::Nearest);
        dc.pop_attributes();
        assert_eq!(dc.state(), RenderState::default());
        assert_eq!(dc.depth(), 0);
    }

    #[test]
    fn test_pop_on_empty_stack_is_ignored() {
        let mut dc = GlStateContext::new();
        dc.set_depth_test(false);
        dc.pop_attributes();
        assert!(!dc.state().depth_test);
    }
}
