//! Shaders, Techniques and Passes
//!
//! ```text
//! Shader ──► Technique (per render system / renderer)
//!               └─► Pass[] ──► GpuProgram per stage ──► GpuParamDesc
//! ```
//!
//! A shader also declares the parameters it exposes to materials. Each one
//! names the GPU variable it drives, so one material parameter can feed
//! differently named variables in different shaders.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::param_block::GpuParamBlockUsage;
use super::param_desc::{GpuParamDataType, GpuParamDesc, GpuParamObjectType};
use crate::settings::DeviceInfo;

/// Programmable pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuProgramType {
    Vertex,
    Fragment,
    Geometry,
    Hull,
    Domain,
    Compute,
}

impl GpuProgramType {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Vertex,
        Self::Fragment,
        Self::Geometry,
        Self::Hull,
        Self::Domain,
        Self::Compute,
    ];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A compiled program and the parameters it reflects.
#[derive(Debug)]
pub struct GpuProgram {
    name: String,
    program_type: GpuProgramType,
    param_desc: Arc<GpuParamDesc>,
}

impl GpuProgram {
    #[must_use]
    pub fn new(name: &str, program_type: GpuProgramType, param_desc: GpuParamDesc) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            program_type,
            param_desc: Arc::new(param_desc),
        })
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn program_type(&self) -> GpuProgramType {
        self.program_type
    }

    #[inline]
    #[must_use]
    pub fn param_desc(&self) -> &Arc<GpuParamDesc> {
        &self.param_desc
    }
}

#[derive(Debug, Default)]
pub struct Pass {
    programs: [Option<Arc<GpuProgram>>; GpuProgramType::COUNT],
}

impl Pass {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the program of the stage `program` was compiled for.
    #[must_use]
    pub fn with_program(mut self, program: Arc<GpuProgram>) -> Self {
        let idx = program.program_type().index();
        self.programs[idx] = Some(program);
        self
    }

    #[must_use]
    pub fn program(&self, stage: GpuProgramType) -> Option<&Arc<GpuProgram>> {
        self.programs[stage.index()].as_ref()
    }

    /// Bound programs in stage order.
    pub fn programs(&self) -> impl Iterator<Item = &Arc<GpuProgram>> {
        self.programs.iter().flatten()
    }
}

/// Passes implementing a shader on one render system.
#[derive(Debug)]
pub struct Technique {
    render_system: String,
    renderer: String,
    passes: Vec<Pass>,
}

impl Technique {
    #[must_use]
    pub fn new(render_system: &str, renderer: &str) -> Self {
        Self {
            render_system: render_system.to_string(),
            renderer: renderer.to_string(),
            passes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pass(mut self, pass: Pass) -> Self {
        self.passes.push(pass);
        self
    }

    #[inline]
    #[must_use]
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Whether this technique can run on `device`. [`DeviceInfo::ANY`]
    /// matches every name.
    #[must_use]
    pub fn is_supported(&self, device: &DeviceInfo) -> bool {
        let matches = |ours: &str, theirs: &str| ours == DeviceInfo::ANY || ours == theirs;
        matches(&self.render_system, &device.render_system)
            && matches(&self.renderer, &device.renderer)
    }
}

/// Data parameter a shader exposes to materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderDataParamDesc {
    pub name: String,
    pub gpu_variable_name: String,
    pub param_type: GpuParamDataType,
    pub array_size: u32,
    /// Only meaningful for structs; `0` accepts whatever the program declares.
    pub element_size: u32,
}

/// Texture, sampler or buffer a shader exposes to materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderObjectParamDesc {
    pub name: String,
    pub gpu_variable_name: String,
    pub object_type: GpuParamObjectType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShaderParamBlockDesc {
    pub usage: GpuParamBlockUsage,
}

#[derive(Debug)]
pub struct Shader {
    name: String,
    techniques: Vec<Arc<Technique>>,
    data_params: BTreeMap<String, ShaderDataParamDesc>,
    object_params: BTreeMap<String, ShaderObjectParamDesc>,
    param_blocks: BTreeMap<String, ShaderParamBlockDesc>,
}

impl Shader {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            techniques: Vec::new(),
            data_params: BTreeMap::new(),
            object_params: BTreeMap::new(),
            param_blocks: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_technique(mut self, technique: Technique) -> Self {
        self.techniques.push(Arc::new(technique));
        self
    }

    /// Exposes GPU variable `gpu_variable_name` as material parameter `name`.
    #[must_use]
    pub fn with_data_param(
        mut self,
        name: &str,
        gpu_variable_name: &str,
        param_type: GpuParamDataType,
    ) -> Self {
        self.data_params.insert(
            name.to_string(),
            ShaderDataParamDesc {
                name: name.to_string(),
                gpu_variable_name: gpu_variable_name.to_string(),
                param_type,
                array_size: 1,
                element_size: param_type.element_size().unwrap_or(0),
            },
        );
        self
    }

    /// Like [`Shader::with_data_param`] for arrays and structs.
    #[must_use]
    pub fn with_data_param_desc(mut self, desc: ShaderDataParamDesc) -> Self {
        self.data_params.insert(desc.name.clone(), desc);
        self
    }

    #[must_use]
    pub fn with_object_param(
        mut self,
        name: &str,
        gpu_variable_name: &str,
        object_type: GpuParamObjectType,
    ) -> Self {
        self.object_params.insert(
            name.to_string(),
            ShaderObjectParamDesc {
                name: name.to_string(),
                gpu_variable_name: gpu_variable_name.to_string(),
                object_type,
            },
        );
        self
    }

    #[must_use]
    pub fn with_param_block(mut self, name: &str, usage: GpuParamBlockUsage) -> Self {
        self.param_blocks
            .insert(name.to_string(), ShaderParamBlockDesc { usage });
        self
    }

    /// Finishes building.
    #[must_use]
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn techniques(&self) -> &[Arc<Technique>] {
        &self.techniques
    }

    /// First technique supported by `device`.
    #[must_use]
    pub fn best_technique(&self, device: &DeviceInfo) -> Option<&Arc<Technique>> {
        self.techniques.iter().find(|t| t.is_supported(device))
    }

    #[inline]
    #[must_use]
    pub fn data_params(&self) -> &BTreeMap<String, ShaderDataParamDesc> {
        &self.data_params
    }

    #[inline]
    #[must_use]
    pub fn object_params(&self) -> &BTreeMap<String, ShaderObjectParamDesc> {
        &self.object_params
    }

    /// Declared usage of block `name`, [`GpuParamBlockUsage::Static`] when
    /// the shader doesn't mention it.
    #[must_use]
    pub fn param_block_usage(&self, name: &str) -> GpuParamBlockUsage {
        self.param_blocks
            .get(name)
            .map(|block| block.usage)
            .unwrap_or_default()
    }
}
