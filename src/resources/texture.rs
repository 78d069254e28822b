use std::sync::Arc;

use wgpu::TextureFormat;

use super::view::{GpuViewUsage, ResourceView, ResourceViewCache, ViewableResource};
use super::{ResourceId, next_resource_id};

// ============================================================================
// 1. Texture description
// ============================================================================

/// Dimensionality of a texture resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TextureType {
    Tex1d,
    #[default]
    Tex2d,
    Tex3d,
    Cube,
}

/// What a texture was created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TextureUsage {
    #[default]
    Static,
    Dynamic,
    RenderTarget,
    DepthStencil,
}

/// Properties the device backend created the texture with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub texture_type: TextureType,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Number of mip levels including the base level.
    pub mip_level_count: u32,
    /// Faces (cube) or array layers; 1 for a plain 2D texture.
    pub num_faces: u32,
    pub usage: TextureUsage,
    pub multisample_count: u32,
    /// Vendor specific multisampling hint (e.g. CSAA modes).
    pub multisample_hint: String,
    pub hw_gamma: bool,
}

impl TextureDesc {
    #[must_use]
    pub fn new(texture_type: TextureType, format: TextureFormat, extent: [u32; 3]) -> Self {
        let [width, height, depth] = extent;
        Self {
            texture_type,
            format,
            width,
            height,
            depth,
            mip_level_count: 1,
            num_faces: if texture_type == TextureType::Cube { 6 } else { 1 },
            usage: TextureUsage::Static,
            multisample_count: 1,
            multisample_hint: String::new(),
            hw_gamma: false,
        }
    }

    #[must_use]
    pub fn new_2d(format: TextureFormat, width: u32, height: u32) -> Self {
        Self::new(TextureType::Tex2d, format, [width, height, 1])
    }

    #[must_use]
    pub fn new_cube(format: TextureFormat, size: u32) -> Self {
        Self::new(TextureType::Cube, format, [size, size, 1])
    }

    #[must_use]
    pub fn usage(mut self, usage: TextureUsage) -> Self {
        self.usage = usage;
        self
    }

    #[must_use]
    pub fn mip_levels(mut self, mip_level_count: u32) -> Self {
        self.mip_level_count = mip_level_count.max(1);
        self
    }

    #[must_use]
    pub fn faces(mut self, num_faces: u32) -> Self {
        self.num_faces = num_faces.max(1);
        self
    }

    #[must_use]
    pub fn multisample(mut self, count: u32, hint: &str) -> Self {
        self.multisample_count = count;
        self.multisample_hint = hint.to_string();
        self
    }

    #[must_use]
    pub fn hw_gamma(mut self, enabled: bool) -> Self {
        self.hw_gamma = enabled;
        self
    }
}

// ============================================================================
// 2. Texture resource
// ============================================================================

#[derive(Debug)]
pub struct Texture {
    id: ResourceId,
    label: String,
    desc: TextureDesc,
}

impl Texture {
    #[must_use]
    pub fn new(label: &str, desc: TextureDesc) -> Arc<Self> {
        Arc::new(Self {
            id: next_resource_id(),
            label: label.to_string(),
            desc,
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    #[inline]
    #[must_use]
    pub fn texture_type(&self) -> TextureType {
        self.desc.texture_type
    }

    #[inline]
    #[must_use]
    pub fn usage(&self) -> TextureUsage {
        self.desc.usage
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> TextureFormat {
        self.desc.format
    }

    /// Bits per texel of the texture's format, 0 when the format has no
    /// well-defined copy size (packed depth/stencil, compressed blocks).
    #[must_use]
    pub fn color_depth_bits(&self) -> u32 {
        if self.desc.format.is_compressed() {
            return 0;
        }
        self.desc.format.block_copy_size(None).map_or(0, |bytes| bytes * 8)
    }
}

impl ViewableResource for Texture {
    type ViewDesc = TextureViewDesc;

    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }
}

// ============================================================================
// 3. Texture views
// ============================================================================

/// Sub-range of a texture exposed as one view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureViewDesc {
    pub most_detailed_mip: u32,
    pub num_mips: u32,
    pub first_array_slice: u32,
    pub num_array_slices: u32,
    pub usage: GpuViewUsage,
}

impl Default for TextureViewDesc {
    fn default() -> Self {
        Self {
            most_detailed_mip: 0,
            num_mips: 1,
            first_array_slice: 0,
            num_array_slices: 1,
            usage: GpuViewUsage::SHADER_RESOURCE,
        }
    }
}

pub type TextureView = ResourceView<Texture>;
pub type TextureViewCache = ResourceViewCache<Texture>;

impl ResourceView<Texture> {
    #[inline]
    #[must_use]
    pub fn texture(&self) -> &Arc<Texture> {
        self.resource()
    }

    #[inline]
    #[must_use]
    pub fn most_detailed_mip(&self) -> u32 {
        self.desc().most_detailed_mip
    }

    #[inline]
    #[must_use]
    pub fn num_mips(&self) -> u32 {
        self.desc().num_mips
    }

    #[inline]
    #[must_use]
    pub fn first_array_slice(&self) -> u32 {
        self.desc().first_array_slice
    }

    #[inline]
    #[must_use]
    pub fn num_array_slices(&self) -> u32 {
        self.desc().num_array_slices
    }

    #[inline]
    #[must_use]
    pub fn usage(&self) -> GpuViewUsage {
        self.desc().usage
    }
}

impl ResourceViewCache<Texture> {
    /// Requests a view of `texture` covering the given mip and slice range.
    pub fn request_texture_view(
        &self,
        texture: &Arc<Texture>,
        most_detailed_mip: u32,
        num_mips: u32,
        first_array_slice: u32,
        num_array_slices: u32,
        usage: GpuViewUsage,
    ) -> Arc<TextureView> {
        self.request_view(
            texture,
            TextureViewDesc {
                most_detailed_mip,
                num_mips,
                first_array_slice,
                num_array_slices,
                usage,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_desc_has_six_faces() {
        let desc = TextureDesc::new_cube(TextureFormat::Rgba8Unorm, 128);
        assert_eq!(desc.num_faces, 6);
        assert_eq!(desc.texture_type, TextureType::Cube);
    }

    #[test]
    fn color_depth_follows_format() {
        let rgba8 = Texture::new("a", TextureDesc::new_2d(TextureFormat::Rgba8Unorm, 4, 4));
        let rgba16f = Texture::new("b", TextureDesc::new_2d(TextureFormat::Rgba16Float, 4, 4));
        assert_eq!(rgba8.color_depth_bits(), 32);
        assert_eq!(rgba16f.color_depth_bits(), 64);
    }

    #[test]
    fn textures_get_unique_ids() {
        let a = Texture::new("a", TextureDesc::new_2d(TextureFormat::R8Unorm, 1, 1));
        let b = Texture::new("b", TextureDesc::new_2d(TextureFormat::R8Unorm, 1, 1));
        assert_ne!(a.id(), b.id());
    }
}
