use std::sync::Arc;

use super::{ResourceId, next_resource_id};

/// Sampling state bound to a material sampler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    pub address_mode_u: wgpu::AddressMode,
    pub address_mode_v: wgpu::AddressMode,
    pub address_mode_w: wgpu::AddressMode,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::MipmapFilterMode,
    pub compare: Option<wgpu::CompareFunction>,
    /// 1 disables anisotropic filtering.
    pub anisotropy_clamp: u16,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            compare: None,
            anisotropy_clamp: 1,
        }
    }
}

#[derive(Debug)]
pub struct SamplerState {
    id: ResourceId,
    desc: SamplerDesc,
}

impl SamplerState {
    #[must_use]
    pub fn new(desc: SamplerDesc) -> Arc<Self> {
        Arc::new(Self {
            id: next_resource_id(),
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
    pub fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
}
