use std::sync::Arc;

use super::view::{GpuViewUsage, ResourceView, ResourceViewCache, ViewableResource};
use super::{ResourceId, next_resource_id};
use crate::errors::{Error, Result};

/// Layout of a generic GPU buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GpuBufferType {
    #[default]
    Structured,
    Raw,
    Indirect,
    Append,
    Consume,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GpuBufferDesc {
    pub buffer_type: GpuBufferType,
    pub element_count: u32,
    /// Size of one element in bytes.
    pub element_size: u32,
    pub random_access: bool,
    pub use_counter: bool,
}

impl GpuBufferDesc {
    #[must_use]
    pub fn structured(element_count: u32, element_size: u32) -> Self {
        Self {
            buffer_type: GpuBufferType::Structured,
            element_count,
            element_size,
            random_access: false,
            use_counter: false,
        }
    }

    #[must_use]
    pub fn random_access(mut self, enabled: bool) -> Self {
        self.random_access = enabled;
        self
    }

    #[must_use]
    pub fn use_counter(mut self, enabled: bool) -> Self {
        self.use_counter = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        u64::from(self.element_count) * u64::from(self.element_size)
    }
}

#[derive(Debug)]
pub struct GpuBuffer {
    id: ResourceId,
    label: String,
    desc: GpuBufferDesc,
}

impl GpuBuffer {
    #[must_use]
    pub fn new(label: &str, desc: GpuBufferDesc) -> Arc<Self> {
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
    pub fn desc(&self) -> &GpuBufferDesc {
        &self.desc
    }
}

impl ViewableResource for GpuBuffer {
    type ViewDesc = GpuBufferViewDesc;

    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Element range of a buffer exposed as one view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GpuBufferViewDesc {
    pub first_element: u32,
    pub num_elements: u32,
    pub element_width: u32,
    pub use_counter: bool,
    pub usage: GpuViewUsage,
}

pub type GpuBufferView = ResourceView<GpuBuffer>;
pub type GpuBufferViewCache = ResourceViewCache<GpuBuffer>;

impl ResourceView<GpuBuffer> {
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &Arc<GpuBuffer> {
        self.resource()
    }

    #[inline]
    #[must_use]
    pub fn first_element(&self) -> u32 {
        self.desc().first_element
    }

    #[inline]
    #[must_use]
    pub fn num_elements(&self) -> u32 {
        self.desc().num_elements
    }
}

impl ResourceViewCache<GpuBuffer> {
    /// Requests a view of `num_elements` elements starting at `first_element`.
    ///
    /// Element width and counter usage are taken from the buffer itself.
    pub fn request_buffer_view(
        &self,
        buffer: &Arc<GpuBuffer>,
        first_element: u32,
        num_elements: u32,
        usage: GpuViewUsage,
    ) -> Result<Arc<GpuBufferView>> {
        let available = buffer.desc.element_count;
        let end = first_element.saturating_add(num_elements);
        if end > available {
            return Err(Error::ElementRangeOutOfBounds {
                first: first_element,
                end,
                available,
            });
        }

        Ok(self.request_view(
            buffer,
            GpuBufferViewDesc {
                first_element,
                num_elements,
                element_width: buffer.desc.element_size,
                use_counter: buffer.desc.use_counter,
                usage,
            },
        ))
    }
}
