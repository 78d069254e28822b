use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::backend::ParamBlockUploader;
use crate::errors::{Error, Result};

static NEXT_PARAM_BLOCK_ID: AtomicU64 = AtomicU64::new(0);

/// How often a block is expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GpuParamBlockUsage {
    #[default]
    Static,
    Dynamic,
}

#[derive(Debug)]
struct BlockState {
    data: Vec<u8>,
    dirty: bool,
}

/// CPU copy of one param block.
///
/// Writes mark the block dirty; [`GpuParamBlockBuffer::update_if_dirty`]
/// pushes the bytes to the device and clears the flag. Contents and flag sit
/// behind one lock so a flush never observes a half-written value.
#[derive(Debug)]
pub struct GpuParamBlockBuffer {
    id: u64,
    label: String,
    usage: GpuParamBlockUsage,
    size: u32,
    version: AtomicU64,
    state: Mutex<BlockState>,
}

impl GpuParamBlockBuffer {
    /// Zero-filled block of `size` bytes. New blocks start dirty.
    #[must_use]
    pub fn new(label: &str, size: u32, usage: GpuParamBlockUsage) -> Arc<Self> {
        let id = NEXT_PARAM_BLOCK_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("Created param block '{label}' #{id} ({size} bytes)");
        Arc::new(Self {
            id,
            label: label.to_string(),
            usage,
            size,
            version: AtomicU64::new(0),
            state: Mutex::new(BlockState {
                data: vec![0; size as usize],
                dirty: true,
            }),
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    #[must_use]
    pub fn usage(&self) -> GpuParamBlockUsage {
        self.usage
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Incremented on every write.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    /// Copies `bytes` into the block at `offset`.
    pub fn write(&self, offset: u32, bytes: &[u8]) -> Result<()> {
        let range = self.range(offset, bytes.len())?;
        let mut state = self.state.lock();
        state.data[range].copy_from_slice(bytes);
        state.dirty = true;
        self.version.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Clears `len` bytes starting at `offset`.
    pub fn zero_out(&self, offset: u32, len: u32) -> Result<()> {
        let range = self.range(offset, len as usize)?;
        let mut state = self.state.lock();
        state.data[range].fill(0);
        state.dirty = true;
        self.version.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Copies `len` bytes starting at `offset` out of the block.
    pub fn read(&self, offset: u32, len: u32) -> Result<Vec<u8>> {
        let range = self.range(offset, len as usize)?;
        Ok(self.state.lock().data[range].to_vec())
    }

    /// Snapshot of the whole block.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Uploads the block if anything changed since the last upload.
    ///
    /// Returns whether an upload happened. A failed upload leaves the block
    /// dirty.
    pub fn update_if_dirty(&self, uploader: &mut dyn ParamBlockUploader) -> Result<bool> {
        let mut state = self.state.lock();
        if !state.dirty {
            return Ok(false);
        }

        uploader.upload(self, &state.data)?;
        state.dirty = false;
        Ok(true)
    }

    fn range(&self, offset: u32, len: usize) -> Result<std::ops::Range<usize>> {
        let start = offset as usize;
        let end = start.saturating_add(len);
        if end > self.size as usize {
            return Err(Error::ParamBlockOverflow {
                offset,
                len: len as u32,
                size: self.size,
            });
        }
        Ok(start..end)
    }
}
