//! Materials
//!
//! Binding of material parameters to the GPU parameters of a shader's
//! programs.
//!
//! - [`param_desc`]: reflected layout of one GPU program
//! - [`shader`]: shaders, techniques, passes and programs
//! - [`resolve`]: cross-stage validity of names and blocks
//! - [`param_block`]: CPU copies of param blocks with dirty tracking
//! - [`gpu_params`]: per-program bindings
//! - [`binder`]: the [`Material`] itself

pub mod binder;
pub mod gpu_params;
pub mod param_block;
pub mod param_desc;
pub mod resolve;
pub mod shader;
pub mod values;

pub use binder::{Material, MaterialSnapshot, PassParameters};
pub use gpu_params::GpuParams;
pub use param_block::{GpuParamBlockBuffer, GpuParamBlockUsage};
pub use param_desc::{
    GpuParamBlockDesc, GpuParamDataDesc, GpuParamDataType, GpuParamDesc, GpuParamObjectDesc,
    GpuParamObjectType, ParamKind, are_params_equal,
};
pub use shader::{
    GpuProgram, GpuProgramType, Pass, Shader, ShaderDataParamDesc, ShaderObjectParamDesc,
    ShaderParamBlockDesc, Technique,
};
pub use values::{MaterialValue, ParamValues, StructData};
