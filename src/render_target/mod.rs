//! Render Targets
//!
//! A render target is anything passes draw into. The only implementation in
//! this crate is [`MultiRenderTexture`], which composes up to
//! [`MAX_MULTIPLE_RENDER_TARGETS`] color surfaces and an optional
//! depth/stencil surface into one logical target.

pub mod multi_render_texture;

pub use multi_render_texture::{
    MAX_MULTIPLE_RENDER_TARGETS, MultiRenderTexture, MultiRenderTextureDesc, RenderSurfaceDesc,
};

use crate::errors::Result;
use crate::resources::Texture;

/// The four properties every surface of one target must agree on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SurfaceProperties {
    pub width: u32,
    pub height: u32,
    pub multisample_count: u32,
    pub multisample_hint: String,
}

impl SurfaceProperties {
    #[must_use]
    pub fn of(texture: &Texture) -> Self {
        let desc = texture.desc();
        Self {
            width: desc.width,
            height: desc.height,
            multisample_count: desc.multisample_count,
            multisample_hint: desc.multisample_hint.clone(),
        }
    }
}

/// Target-level properties derived from the first bound color surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderTargetProperties {
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
    pub active: bool,
    pub hw_gamma: bool,
    pub multisample_count: u32,
    pub multisample_hint: String,
}

impl RenderTargetProperties {
    #[must_use]
    pub fn from_texture(texture: &Texture) -> Self {
        let desc = texture.desc();
        Self {
            width: desc.width,
            height: desc.height,
            color_depth: texture.color_depth_bits(),
            active: true,
            hw_gamma: desc.hw_gamma,
            multisample_count: desc.multisample_count,
            multisample_hint: desc.multisample_hint.clone(),
        }
    }
}

/// Which buffer of a target a read-back refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameBuffer {
    Front,
    Back,
    #[default]
    Auto,
}

pub trait RenderTarget {
    fn properties(&self) -> &RenderTargetProperties;

    /// Copies the target's contents into CPU memory.
    fn copy_to_memory(&self, dst: &mut [u8], buffer: FrameBuffer) -> Result<()>;
}
