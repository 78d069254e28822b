//! Multi Render Texture
//!
//! Binds several textures as the color attachments of one target.
//!
//! # Validation
//!
//! `initialize` is all-or-nothing. Surfaces are bound first, then checked as a
//! set; any failure releases every view the call acquired before the error is
//! returned, so the view cache ends up exactly as it was.
//!
//! | Check                         | Against                              |
//! |-------------------------------|--------------------------------------|
//! | color texture usage           | `TextureUsage::RenderTarget`         |
//! | depth texture usage           | `TextureUsage::DepthStencil`         |
//! | width/height/samples/hint     | first populated color surface        |
//! | texture type                  | 2D only                              |
//! | first slice + slice count     | ≤ faces of the first surface texture |
//! | mip level                     | < mip levels of the first surface    |

use std::sync::Arc;

use smallvec::SmallVec;

use super::{FrameBuffer, RenderTarget, RenderTargetProperties, SurfaceProperties};
use crate::errors::{Error, Result, SurfaceSlot};
use crate::resources::{
    GpuViewUsage, Texture, TextureType, TextureUsage, TextureView, TextureViewCache,
};

pub const MAX_MULTIPLE_RENDER_TARGETS: usize = 8;

/// One surface of a [`MultiRenderTextureDesc`].
#[derive(Debug, Clone)]
pub struct RenderSurfaceDesc {
    pub texture: Option<Arc<Texture>>,
    pub mip_level: u32,
    pub face: u32,
    pub num_faces: u32,
}

impl Default for RenderSurfaceDesc {
    fn default() -> Self {
        Self {
            texture: None,
            mip_level: 0,
            face: 0,
            num_faces: 1,
        }
    }
}

impl RenderSurfaceDesc {
    #[must_use]
    pub fn new(texture: Arc<Texture>) -> Self {
        Self {
            texture: Some(texture),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn mip_level(mut self, mip_level: u32) -> Self {
        self.mip_level = mip_level;
        self
    }

    #[must_use]
    pub fn faces(mut self, face: u32, num_faces: u32) -> Self {
        self.face = face;
        self.num_faces = num_faces;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MultiRenderTextureDesc {
    /// Indexed by attachment slot; entries without a texture leave the slot empty.
    pub color_surfaces: SmallVec<[RenderSurfaceDesc; MAX_MULTIPLE_RENDER_TARGETS]>,
    pub depth_stencil_surface: RenderSurfaceDesc,
}

impl MultiRenderTextureDesc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a color surface in the next slot.
    #[must_use]
    pub fn with_color(mut self, surface: RenderSurfaceDesc) -> Self {
        self.color_surfaces.push(surface);
        self
    }

    #[must_use]
    pub fn with_depth_stencil(mut self, surface: RenderSurfaceDesc) -> Self {
        self.depth_stencil_surface = surface;
        self
    }
}

pub struct MultiRenderTexture {
    properties: RenderTargetProperties,
    color_surfaces: [Option<Arc<TextureView>>; MAX_MULTIPLE_RENDER_TARGETS],
    depth_stencil_surface: Option<Arc<TextureView>>,
    view_cache: Arc<TextureViewCache>,
    destroyed: bool,
}

impl MultiRenderTexture {
    /// Binds and validates every surface of `desc`.
    ///
    /// On error no view acquired by this call stays referenced.
    pub fn initialize(
        desc: &MultiRenderTextureDesc,
        view_cache: &Arc<TextureViewCache>,
    ) -> Result<Self> {
        let mut target = Self {
            properties: RenderTargetProperties::default(),
            color_surfaces: Default::default(),
            depth_stencil_surface: None,
            view_cache: Arc::clone(view_cache),
            destroyed: false,
        };

        if let Err(err) = target.bind_surfaces(desc).and_then(|()| target.validate()) {
            if let Err(release_err) = target.destroy() {
                log::error!("Failed to roll back render target surfaces: {release_err}");
            }
            return Err(err);
        }

        log::debug!(
            "Initialized multi render texture {}x{} ({} color surfaces, depth: {})",
            target.properties.width,
            target.properties.height,
            target.color_surfaces.iter().flatten().count(),
            target.depth_stencil_surface.is_some()
        );
        Ok(target)
    }

    fn bind_surfaces(&mut self, desc: &MultiRenderTextureDesc) -> Result<()> {
        let mut properties_set = false;

        for (idx, surface) in desc.color_surfaces.iter().enumerate() {
            let Some(texture) = &surface.texture else {
                continue;
            };

            if idx >= MAX_MULTIPLE_RENDER_TARGETS {
                log::warn!(
                    "Render texture index {idx} exceeds the maximum of {MAX_MULTIPLE_RENDER_TARGETS} render targets, ignoring surface"
                );
                continue;
            }

            if texture.usage() != TextureUsage::RenderTarget {
                return Err(Error::InvalidUsage {
                    surface: SurfaceSlot::Color(idx),
                    expected: TextureUsage::RenderTarget,
                    found: texture.usage(),
                });
            }

            self.color_surfaces[idx] = Some(self.view_cache.request_texture_view(
                texture,
                surface.mip_level,
                1,
                surface.face,
                surface.num_faces,
                GpuViewUsage::RENDER_TARGET,
            ));

            if !properties_set {
                self.properties = RenderTargetProperties::from_texture(texture);
                properties_set = true;
            }
        }

        if let Some(texture) = &desc.depth_stencil_surface.texture {
            if texture.usage() != TextureUsage::DepthStencil {
                return Err(Error::InvalidUsage {
                    surface: SurfaceSlot::DepthStencil,
                    expected: TextureUsage::DepthStencil,
                    found: texture.usage(),
                });
            }

            let surface = &desc.depth_stencil_surface;
            self.depth_stencil_surface = Some(self.view_cache.request_texture_view(
                texture,
                surface.mip_level,
                1,
                surface.face,
                surface.num_faces,
                GpuViewUsage::DEPTH_STENCIL,
            ));
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let mut populated = self
            .color_surfaces
            .iter()
            .enumerate()
            .filter_map(|(idx, view)| view.as_ref().map(|view| (idx, view)));

        let Some((_, first)) = populated.next() else {
            return Ok(());
        };
        let expected = SurfaceProperties::of(first.texture());

        for (idx, view) in populated {
            let found = SurfaceProperties::of(view.texture());
            if found != expected {
                return Err(Error::SurfaceMismatch {
                    surface: SurfaceSlot::Color(idx),
                    expected,
                    found,
                });
            }
        }

        let texture = first.texture();
        if texture.texture_type() != TextureType::Tex2d {
            return Err(Error::UnsupportedTextureType {
                found: texture.texture_type(),
            });
        }

        let last_face = first.first_array_slice() + first.num_array_slices();
        if last_face > texture.desc().num_faces {
            return Err(Error::FaceOutOfRange {
                requested: last_face,
                available: texture.desc().num_faces,
            });
        }

        if first.most_detailed_mip() >= texture.desc().mip_level_count {
            return Err(Error::MipOutOfRange {
                requested: first.most_detailed_mip(),
                available: texture.desc().mip_level_count,
            });
        }

        if let Some(depth) = &self.depth_stencil_surface {
            let found = SurfaceProperties::of(depth.texture());
            if found != expected {
                return Err(Error::SurfaceMismatch {
                    surface: SurfaceSlot::DepthStencil,
                    expected,
                    found,
                });
            }
        }

        Ok(())
    }

    /// Releases every held view back to the cache, color slots in order and
    /// the depth/stencil view last. Calling it again is a no-op.
    pub fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;

        let mut first_err = None;
        let held = self
            .color_surfaces
            .iter_mut()
            .map(Option::take)
            .chain(std::iter::once(self.depth_stencil_surface.take()))
            .flatten();
        for view in held {
            if let Err(err) = self.view_cache.release_view(&view) {
                first_err.get_or_insert(err);
            }
        }

        self.properties.active = false;
        first_err.map_or(Ok(()), Err)
    }

    #[inline]
    #[must_use]
    pub fn color_surface(&self, idx: usize) -> Option<&Arc<TextureView>> {
        self.color_surfaces.get(idx).and_then(Option::as_ref)
    }

    #[inline]
    #[must_use]
    pub fn depth_stencil_surface(&self) -> Option<&Arc<TextureView>> {
        self.depth_stencil_surface.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl RenderTarget for MultiRenderTexture {
    fn properties(&self) -> &RenderTargetProperties {
        &self.properties
    }

    fn copy_to_memory(&self, _dst: &mut [u8], _buffer: FrameBuffer) -> Result<()> {
        Err(Error::NotSupported("MultiRenderTexture::copy_to_memory"))
    }
}

impl Drop for MultiRenderTexture {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log::error!("Failed to release render target surfaces: {err}");
        }
    }
}

impl std::fmt::Debug for MultiRenderTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiRenderTexture")
            .field("properties", &self.properties)
            .field("color_surfaces", &self.color_surfaces)
            .field("depth_stencil_surface", &self.depth_stencil_surface)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
