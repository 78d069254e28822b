//! wgpu Param Block Upload
//!
//! Each [`GpuParamBlockBuffer`] gets one uniform buffer on the device, keyed
//! by the block id and created on its first upload.
//!
//! ```rust,ignore
//! let mut store = WgpuParamBlockStore::default();
//!
//! // Once per frame, on the render thread:
//! let mut uploader = store.uploader(&device, &queue);
//! material.update_param_blocks(&mut uploader)?;
//!
//! let buffer = store.buffer(block.id()).unwrap();
//! ```

use rustc_hash::FxHashMap;

use super::ParamBlockUploader;
use crate::errors::Result;
use crate::material::GpuParamBlockBuffer;

/// Device-side buffer backing one param block.
#[derive(Debug)]
pub struct GpuUniformBuffer {
    pub buffer: wgpu::Buffer,
    pub size: u64,
    pub upload_count: u64,
}

/// Owns the device buffers of every uploaded param block.
#[derive(Debug, Default)]
pub struct WgpuParamBlockStore {
    buffers: FxHashMap<u64, GpuUniformBuffer>,
}

impl WgpuParamBlockStore {
    /// Borrows the store for one round of uploads.
    pub fn uploader<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
    ) -> WgpuParamBlockUploader<'a> {
        WgpuParamBlockUploader {
            device,
            queue,
            store: self,
        }
    }

    /// Device buffer of block `id`, if it has been uploaded.
    #[must_use]
    pub fn buffer(&self, id: u64) -> Option<&wgpu::Buffer> {
        self.buffers.get(&id).map(|gpu| &gpu.buffer)
    }

    /// Drops the device buffer of a block that is no longer used.
    pub fn remove(&mut self, id: u64) -> bool {
        self.buffers.remove(&id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// [`ParamBlockUploader`] writing through `wgpu::Queue::write_buffer`.
pub struct WgpuParamBlockUploader<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    store: &'a mut WgpuParamBlockStore,
}

impl ParamBlockUploader for WgpuParamBlockUploader<'_> {
    fn upload(&mut self, block: &GpuParamBlockBuffer, data: &[u8]) -> Result<()> {
        // Uniform bindings are sized in 16-byte units.
        let size = (data.len() as u64).next_multiple_of(16).max(16);

        let gpu = self.store.buffers.entry(block.id()).or_insert_with(|| {
            log::debug!("Creating uniform buffer for param block '{}'", block.label());
            GpuUniformBuffer {
                buffer: create_uniform_buffer(self.device, block.label(), size),
                size,
                upload_count: 0,
            }
        });

        if size > gpu.size {
            log::debug!(
                "Resizing uniform buffer {:?} from {} to {}",
                block.label(),
                gpu.size,
                size
            );
            gpu.buffer = create_uniform_buffer(self.device, block.label(), size);
            gpu.size = size;
        }

        if data.len() % wgpu::COPY_BUFFER_ALIGNMENT as usize == 0 {
            self.queue.write_buffer(&gpu.buffer, 0, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(data.len().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize), 0);
            self.queue.write_buffer(&gpu.buffer, 0, &padded);
        }

        gpu.upload_count += 1;
        Ok(())
    }
}

fn create_uniform_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
