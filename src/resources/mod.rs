//! GPU Resource Descriptions
//!
//! CPU-side descriptions of the base resources the device backend creates,
//! and the reference-counted view cache layered on top of them.
//!
//! - [`Texture`] / [`GpuBuffer`]: immutable base resources identified by a
//!   process-unique [`ResourceId`].
//! - [`ResourceViewCache`]: deduplicates views keyed by `(resource, descriptor)`.
//! - [`SamplerState`]: sampler description bound to material object parameters.

pub mod buffer;
pub mod sampler;
pub mod texture;
pub mod view;

use std::sync::atomic::{AtomicU64, Ordering};

pub use buffer::{GpuBuffer, GpuBufferDesc, GpuBufferType, GpuBufferView, GpuBufferViewCache, GpuBufferViewDesc};
pub use sampler::{SamplerDesc, SamplerState};
pub use texture::{Texture, TextureDesc, TextureType, TextureUsage, TextureView, TextureViewCache, TextureViewDesc};
pub use view::{GpuViewUsage, ResourceView, ResourceViewCache, ViewId, ViewableResource};

/// Unique identifier of a base GPU resource.
pub type ResourceId = u64;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_resource_id() -> ResourceId {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}
