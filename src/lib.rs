#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Tessera
//!
//! The layer between material/scene descriptions and a graphics device:
//!
//! - [`resources`]: textures, buffers, samplers and the reference-counted
//!   [`ResourceViewCache`] handing out views over them
//! - [`render_target`]: [`MultiRenderTexture`], several surfaces validated and
//!   composed into one render target
//! - [`material`]: [`Material`], resolving a shader's parameters across passes
//!   and stages and fanning writes out to param block buffers
//! - [`core_thread`]: the render thread, its [`CommandQueue`] and [`AsyncOp`]
//! - [`backend`]: param block upload through wgpu
//! - [`input`]: drag-and-drop state fed by platform events

pub mod backend;
pub mod core_thread;
pub mod errors;
pub mod input;
pub mod material;
pub mod render_target;
pub mod resources;
pub mod settings;

pub use backend::{ParamBlockUploader, WgpuParamBlockStore, WgpuParamBlockUploader};
pub use core_thread::{AsyncOp, AsyncValue, CommandQueue, CoreThread};
pub use errors::{Error, ErrorKind, Result};
pub use input::{DragAndDropManager, DragEvent, DragOutcome};
pub use material::{
    GpuParamBlockBuffer, GpuParamDesc, GpuProgram, GpuProgramType, Material, Pass, Shader,
    StructData, Technique,
};
pub use render_target::{
    MAX_MULTIPLE_RENDER_TARGETS, MultiRenderTexture, MultiRenderTextureDesc, RenderSurfaceDesc,
    RenderTarget,
};
pub use resources::{
    GpuBuffer, GpuViewUsage, ResourceViewCache, SamplerState, Texture, TextureDesc,
    TextureViewCache,
};
pub use settings::{CoreSettings, DeviceInfo};
