//! Device Backends
//!
//! The core layer never talks to a graphics API directly. Param block
//! contents leave the CPU through a [`ParamBlockUploader`], which the render
//! thread drives once per frame.

pub mod wgpu_uploader;

pub use wgpu_uploader::{WgpuParamBlockStore, WgpuParamBlockUploader};

use crate::errors::Result;
use crate::material::GpuParamBlockBuffer;

/// Receives the bytes of dirty param blocks.
///
/// `upload` runs while the block is locked: implementations must not call
/// back into `block` for anything but its immutable identity (`id`, `label`,
/// `size`, `usage`).
pub trait ParamBlockUploader {
    fn upload(&mut self, block: &GpuParamBlockBuffer, data: &[u8]) -> Result<()>;
}
