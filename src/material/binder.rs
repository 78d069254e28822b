//! Material
//!
//! A [`Material`] drives the parameters of one [`Shader`]. Binding a shader
//! selects its best technique for the active device and resolves every
//! exposed parameter against the programs of every pass:
//!
//! ```text
//!                        ┌──────────────────────── pass 0 ───────────────┐
//!  set_vec4("tint", v) ─►│ vertex GpuParams   ─► "PerObject" block ─┐    │
//!          │             │ fragment GpuParams ─► "PerObject" block ─┤    │
//!          │             └──────────────────────────────────────────┼────┘
//!          │             ┌──────────────────────── pass 1 ──────────┼────┐
//!          └────────────►│ fragment GpuParams ─► "PerObject" block ─┤    │
//!                        └──────────────────────────────────────────┼────┘
//!                                                                   ▼
//!                                              one shared GpuParamBlockBuffer
//! ```
//!
//! Shareable blocks get one buffer per material, reused by every stage that
//! declares them. Every other block gets its own buffer per pass and stage.
//! Writes update the material's value cache and every stage declaring the
//! GPU variable; reads come from the cache.
//!
//! Using a material before [`Material::set_shader`] succeeded is a contract
//! violation.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::gpu_params::GpuParams;
use super::param_block::GpuParamBlockBuffer;
use super::param_desc::{GpuParamDataDesc, GpuParamDataType, GpuParamDesc, ParamKind};
use super::resolve;
use super::shader::{GpuProgramType, Pass, Shader, Technique};
use super::values::{MaterialValue, ParamValues, StructData};
use crate::backend::ParamBlockUploader;
use crate::errors::{ContractViolation, Error, Result, contract_violation};
use crate::resources::{SamplerState, Texture};
use crate::settings::DeviceInfo;

/// GPU parameters of every stage of one pass.
#[derive(Debug, Default)]
pub struct PassParameters {
    stages: [Option<GpuParams>; GpuProgramType::COUNT],
}

impl PassParameters {
    #[must_use]
    pub fn stage(&self, stage: GpuProgramType) -> Option<&GpuParams> {
        self.stages[stage.index()].as_ref()
    }

    /// Populated stages in stage order.
    pub fn iter(&self) -> impl Iterator<Item = &GpuParams> {
        self.stages.iter().flatten()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut GpuParams> {
        self.stages.iter_mut().flatten()
    }
}

/// Serializable copy of a material's data parameter values.
///
/// Object parameters are resource handles and are not captured.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialSnapshot {
    pub shader: String,
    pub values: BTreeMap<String, ParamValues>,
}

/// Everything derived from the bound shader.
#[derive(Debug)]
struct BoundShader {
    shader: Arc<Shader>,
    technique: Arc<Technique>,
    /// Material parameter name → GPU variable name.
    valid_params: FxHashMap<String, String>,
    valid_shareable_param_blocks: FxHashSet<String>,
    /// GPU variable name → block name.
    param_to_block: FxHashMap<String, String>,
    /// Material parameter name → reflected layout of its GPU variable.
    data_params: FxHashMap<String, GpuParamDataDesc>,
    object_kinds: FxHashMap<String, ParamKind>,
    values: FxHashMap<String, ParamValues>,
    textures: FxHashMap<String, Option<Arc<Texture>>>,
    samplers: FxHashMap<String, Option<Arc<SamplerState>>>,
    shared_blocks: FxHashMap<String, Arc<GpuParamBlockBuffer>>,
    passes: Vec<PassParameters>,
}

impl BoundShader {
    fn build(shader: &Arc<Shader>, device: &DeviceInfo) -> Result<Self> {
        let technique = shader.best_technique(device).cloned().ok_or_else(|| {
            Error::NoSupportedTechnique {
                shader: shader.name().to_string(),
                render_system: device.render_system.clone(),
            }
        })?;

        let descs: Vec<&GpuParamDesc> = technique
            .passes()
            .iter()
            .flat_map(Pass::programs)
            .map(|program| program.param_desc().as_ref())
            .collect();

        let valid_data = resolve::determine_valid_data_parameters(&descs);
        let valid_objects = resolve::determine_valid_object_parameters(&descs);
        let valid_shareable = resolve::determine_valid_shareable_param_blocks(&descs);
        let param_to_block = resolve::determine_parameter_to_block_mapping(&descs);

        let mut valid_params = FxHashMap::default();
        let mut data_params = FxHashMap::default();
        let mut values = FxHashMap::default();

        for (name, shader_param) in shader.data_params() {
            let gpu_name = shader_param.gpu_variable_name.as_str();
            let Some(&gpu_param) = valid_data.get(gpu_name) else {
                log::debug!(
                    "Material parameter '{name}': no valid GPU variable '{gpu_name}' in the selected technique, skipping"
                );
                continue;
            };

            if gpu_param.param_type != shader_param.param_type {
                log::warn!(
                    "Material parameter '{name}' is declared as {:?} but GPU variable '{gpu_name}' is {:?}, skipping",
                    shader_param.param_type,
                    gpu_param.param_type
                );
                continue;
            }

            if let Some(size) = gpu_param.param_type.element_size()
                && size != gpu_param.element_size
            {
                log::warn!(
                    "GPU variable '{gpu_name}' is {:?} but declares {}-byte elements, skipping material parameter '{name}'",
                    gpu_param.param_type,
                    gpu_param.element_size
                );
                continue;
            }

            if gpu_param.array_size != shader_param.array_size {
                log::warn!(
                    "Material parameter '{name}' has array size {} but GPU variable '{gpu_name}' has {}, skipping",
                    shader_param.array_size,
                    gpu_param.array_size
                );
                continue;
            }

            if shader_param.param_type == GpuParamDataType::Struct
                && shader_param.element_size != 0
                && shader_param.element_size != gpu_param.element_size
            {
                log::warn!(
                    "Material parameter '{name}' is a {}-byte struct but GPU variable '{gpu_name}' is {} bytes, skipping",
                    shader_param.element_size,
                    gpu_param.element_size
                );
                continue;
            }

            valid_params.insert(name.clone(), gpu_name.to_string());
            values.insert(
                name.clone(),
                ParamValues::zeroed(
                    gpu_param.param_type,
                    gpu_param.array_size,
                    gpu_param.element_size,
                ),
            );
            data_params.insert(name.clone(), gpu_param.clone());
        }

        let mut object_kinds = FxHashMap::default();
        let mut textures = FxHashMap::default();
        let mut samplers = FxHashMap::default();

        for (name, shader_param) in shader.object_params() {
            let gpu_name = shader_param.gpu_variable_name.as_str();
            if !valid_objects.contains(gpu_name) {
                log::debug!(
                    "Material parameter '{name}': GPU object '{gpu_name}' not used by the selected technique, skipping"
                );
                continue;
            }

            let kind = shader_param.object_type.kind();
            match kind {
                ParamKind::Texture => {
                    textures.insert(name.clone(), None);
                }
                ParamKind::Sampler => {
                    samplers.insert(name.clone(), None);
                }
                ParamKind::Buffer | ParamKind::Data(_) => {}
            }
            valid_params.insert(name.clone(), gpu_name.to_string());
            object_kinds.insert(name.clone(), kind);
        }

        let mut shareable: Vec<&str> = valid_shareable.iter().copied().collect();
        shareable.sort_unstable();

        let mut shared_blocks = FxHashMap::default();
        for name in shareable {
            let size = descs
                .iter()
                .filter_map(|desc| desc.param_blocks.get(name))
                .find(|block| block.is_shareable)
                .map_or(0, |block| block.block_size);
            shared_blocks.insert(
                name.to_string(),
                GpuParamBlockBuffer::new(name, size, shader.param_block_usage(name)),
            );
        }

        let mut passes = Vec::with_capacity(technique.passes().len());
        for (pass_idx, pass) in technique.passes().iter().enumerate() {
            let mut pass_params = PassParameters::default();

            for program in pass.programs() {
                let mut params = GpuParams::new(Arc::clone(program.param_desc()));

                for block in program.param_desc().param_blocks.values() {
                    let shared = block
                        .is_shareable
                        .then(|| shared_blocks.get(&block.name))
                        .flatten();
                    let buffer = if let Some(shared) = shared {
                        Arc::clone(shared)
                    } else {
                        if block.is_shareable {
                            log::debug!(
                                "Param block '{}' can't be shared, allocating a separate buffer for pass {pass_idx} {:?}",
                                block.name,
                                program.program_type()
                            );
                        }
                        GpuParamBlockBuffer::new(
                            &format!(
                                "{}/pass{pass_idx}/{:?}",
                                block.name,
                                program.program_type()
                            ),
                            block.block_size,
                            shader.param_block_usage(&block.name),
                        )
                    };
                    params.set_param_block_buffer(&block.name, buffer)?;
                }

                pass_params.stages[program.program_type().index()] = Some(params);
            }

            passes.push(pass_params);
        }

        let valid_shareable_param_blocks = valid_shareable
            .into_iter()
            .map(str::to_string)
            .collect();
        let param_to_block = param_to_block
            .into_iter()
            .map(|(param, block)| (param.to_string(), block.to_string()))
            .collect();

        log::debug!(
            "Bound shader '{}': {} passes, {} parameters, {} shared blocks",
            shader.name(),
            passes.len(),
            valid_params.len(),
            shared_blocks.len()
        );

        Ok(Self {
            shader: Arc::clone(shader),
            technique,
            valid_params,
            valid_shareable_param_blocks,
            param_to_block,
            data_params,
            object_kinds,
            values,
            textures,
            samplers,
            shared_blocks,
            passes,
        })
    }

    /// Checks a typed access to data parameter `name`.
    fn data_param<T: MaterialValue>(&self, name: &str, array_idx: u32) -> Result<&GpuParamDataDesc> {
        let Some(param) = self.data_params.get(name) else {
            return Err(match self.object_kinds.get(name) {
                Some(&found) => Error::ParamTypeMismatch {
                    name: name.to_string(),
                    expected: ParamKind::Data(T::DATA_TYPE),
                    found,
                },
                None => Error::ParamNotFound {
                    name: name.to_string(),
                },
            });
        };

        if param.param_type != T::DATA_TYPE {
            return Err(Error::ParamTypeMismatch {
                name: name.to_string(),
                expected: ParamKind::Data(T::DATA_TYPE),
                found: ParamKind::Data(param.param_type),
            });
        }

        if array_idx >= param.array_size {
            return Err(Error::ArrayIndexOutOfRange {
                name: name.to_string(),
                index: array_idx,
                size: param.array_size,
            });
        }

        Ok(param)
    }

    /// GPU variable behind object parameter `name`, which must be of kind `expected`.
    fn object_param(&self, name: &str, expected: ParamKind) -> Result<String> {
        let found = match self.object_kinds.get(name) {
            Some(&kind) => kind,
            None => match self.data_params.get(name) {
                Some(param) => ParamKind::Data(param.param_type),
                None => {
                    return Err(Error::ParamNotFound {
                        name: name.to_string(),
                    });
                }
            },
        };

        if found != expected {
            return Err(Error::ParamTypeMismatch {
                name: name.to_string(),
                expected,
                found,
            });
        }

        self.valid_params
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ParamNotFound {
                name: name.to_string(),
            })
    }

    fn check_struct_size<T: MaterialValue>(name: &str, param: &GpuParamDataDesc, value: &T) -> Result<()> {
        if T::DATA_TYPE != GpuParamDataType::Struct {
            return Ok(());
        }
        let size = value.to_gpu_bytes().len() as u32;
        if size != param.element_size {
            return Err(Error::StructSizeMismatch {
                name: name.to_string(),
                expected: param.element_size,
                found: size,
            });
        }
        Ok(())
    }

    fn stages(&self) -> impl Iterator<Item = &GpuParams> {
        self.passes.iter().flat_map(PassParameters::iter)
    }

    fn stages_mut(&mut self) -> impl Iterator<Item = &mut GpuParams> {
        self.passes.iter_mut().flat_map(PassParameters::iter_mut)
    }

    /// Writes one element to every stage declaring `gpu_name`.
    ///
    /// Nothing is written unless every stage accepts the value.
    fn write_gpu<T: MaterialValue>(&self, gpu_name: &str, value: &T, array_idx: u32) -> Result<()> {
        let targets: Vec<&GpuParams> = self
            .stages()
            .filter(|params| params.has_param(gpu_name))
            .collect();

        for params in &targets {
            params.validate_param(gpu_name, value, array_idx)?;
        }
        for params in targets {
            params.set_param(gpu_name, value, array_idx)?;
        }
        Ok(())
    }

    fn set_value<T: MaterialValue>(&mut self, name: &str, value: T, array_idx: u32) -> Result<()> {
        let param = self.data_param::<T>(name, array_idx)?;
        Self::check_struct_size(name, param, &value)?;

        let gpu_name = param.name.clone();
        self.write_gpu(&gpu_name, &value, array_idx)?;

        if let Some(slot) = self
            .values
            .get_mut(name)
            .and_then(T::cache_mut)
            .and_then(|cache| cache.get_mut(array_idx as usize))
        {
            *slot = value;
        }
        Ok(())
    }

    fn get_value<T: MaterialValue>(&self, name: &str, array_idx: u32) -> Result<T> {
        self.data_param::<T>(name, array_idx)?;
        self.values
            .get(name)
            .and_then(T::cache)
            .and_then(|cache| cache.get(array_idx as usize))
            .cloned()
            .ok_or_else(|| Error::ParamNotFound {
                name: name.to_string(),
            })
    }

    /// Validates a whole cached array before any element is written.
    fn check_values<T: MaterialValue>(&self, name: &str, values: &[T]) -> Result<()> {
        let Some(last) = values.len().checked_sub(1) else {
            return Ok(());
        };
        let param = self.data_param::<T>(name, last as u32)?;
        values
            .iter()
            .try_for_each(|value| Self::check_struct_size(name, param, value))
    }

    fn set_values<T: MaterialValue>(&mut self, name: &str, values: &[T]) -> Result<()> {
        for (idx, value) in values.iter().enumerate() {
            self.set_value(name, value.clone(), idx as u32)?;
        }
        Ok(())
    }
}

/// Parameter binder for one shader. See the module docs.
#[derive(Debug, Default)]
pub struct Material {
    bound: Option<BoundShader>,
}

impl Material {
    /// Unbound material.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `shader`, rebuilding every parameter table and block buffer.
    ///
    /// On error the previously bound shader, if any, stays in place.
    pub fn set_shader(&mut self, shader: Arc<Shader>, device: &DeviceInfo) -> Result<()> {
        let bound = BoundShader::build(&shader, device)?;
        self.bound = Some(bound);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.bound.is_some()
    }

    #[must_use]
    pub fn shader(&self) -> Option<&Arc<Shader>> {
        self.bound.as_ref().map(|bound| &bound.shader)
    }

    #[must_use]
    pub fn technique(&self) -> Option<&Arc<Technique>> {
        self.bound.as_ref().map(|bound| &bound.technique)
    }

    fn bound(&self) -> Result<&BoundShader> {
        self.bound
            .as_ref()
            .ok_or_else(|| contract_violation(ContractViolation::MaterialNotInitialized))
    }

    fn bound_mut(&mut self) -> Result<&mut BoundShader> {
        self.bound
            .as_mut()
            .ok_or_else(|| contract_violation(ContractViolation::MaterialNotInitialized))
    }

    // ========================================================================
    // Data parameters
    // ========================================================================

    /// Assigns element `array_idx` of data parameter `name`.
    pub fn set_value<T: MaterialValue>(&mut self, name: &str, value: T, array_idx: u32) -> Result<()> {
        self.bound_mut()?.set_value(name, value, array_idx)
    }

    /// Returns the cached value of element `array_idx` of `name`.
    pub fn get_value<T: MaterialValue>(&self, name: &str, array_idx: u32) -> Result<T> {
        self.bound()?.get_value(name, array_idx)
    }

    pub fn set_float(&mut self, name: &str, value: f32, array_idx: u32) -> Result<()> {
        self.set_value(name, value, array_idx)
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2, array_idx: u32) -> Result<()> {
        self.set_value(name, value, array_idx)
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3, array_idx: u32) -> Result<()> {
        self.set_value(name, value, array_idx)
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4, array_idx: u32) -> Result<()> {
        self.set_value(name, value, array_idx)
    }

    /// Writes an RGBA color into a `Float4` parameter.
    pub fn set_color(&mut self, name: &str, color: impl Into<Vec4>, array_idx: u32) -> Result<()> {
        self.set_value(name, color.into(), array_idx)
    }

    pub fn set_mat3(&mut self, name: &str, value: Mat3, array_idx: u32) -> Result<()> {
        self.set_value(name, value, array_idx)
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4, array_idx: u32) -> Result<()> {
        self.set_value(name, value, array_idx)
    }

    /// The byte size of `value` must equal the struct's declared size.
    pub fn set_struct_data(&mut self, name: &str, value: StructData, array_idx: u32) -> Result<()> {
        self.set_value(name, value, array_idx)
    }

    pub fn get_float(&self, name: &str, array_idx: u32) -> Result<f32> {
        self.get_value(name, array_idx)
    }

    pub fn get_vec2(&self, name: &str, array_idx: u32) -> Result<Vec2> {
        self.get_value(name, array_idx)
    }

    pub fn get_vec3(&self, name: &str, array_idx: u32) -> Result<Vec3> {
        self.get_value(name, array_idx)
    }

    pub fn get_vec4(&self, name: &str, array_idx: u32) -> Result<Vec4> {
        self.get_value(name, array_idx)
    }

    pub fn get_mat3(&self, name: &str, array_idx: u32) -> Result<Mat3> {
        self.get_value(name, array_idx)
    }

    pub fn get_mat4(&self, name: &str, array_idx: u32) -> Result<Mat4> {
        self.get_value(name, array_idx)
    }

    pub fn get_struct_data(&self, name: &str, array_idx: u32) -> Result<StructData> {
        self.get_value(name, array_idx)
    }

    // ========================================================================
    // Object parameters
    // ========================================================================

    /// Binds `texture` (or clears the binding) in every stage using `name`.
    pub fn set_texture(&mut self, name: &str, texture: Option<Arc<Texture>>) -> Result<()> {
        let bound = self.bound_mut()?;
        let gpu_name = bound.object_param(name, ParamKind::Texture)?;

        for params in bound.stages_mut().filter(|params| params.has_texture(&gpu_name)) {
            params.set_texture(&gpu_name, texture.clone())?;
        }
        bound.textures.insert(name.to_string(), texture);
        Ok(())
    }

    pub fn get_texture(&self, name: &str) -> Result<Option<Arc<Texture>>> {
        let bound = self.bound()?;
        bound.object_param(name, ParamKind::Texture)?;
        Ok(bound.textures.get(name).cloned().flatten())
    }

    /// Binds `sampler` (or clears the binding) in every stage using `name`.
    pub fn set_sampler_state(
        &mut self,
        name: &str,
        sampler: Option<Arc<SamplerState>>,
    ) -> Result<()> {
        let bound = self.bound_mut()?;
        let gpu_name = bound.object_param(name, ParamKind::Sampler)?;

        for params in bound
            .stages_mut()
            .filter(|params| params.has_sampler_state(&gpu_name))
        {
            params.set_sampler_state(&gpu_name, sampler.clone())?;
        }
        bound.samplers.insert(name.to_string(), sampler);
        Ok(())
    }

    pub fn get_sampler_state(&self, name: &str) -> Result<Option<Arc<SamplerState>>> {
        let bound = self.bound()?;
        bound.object_param(name, ParamKind::Sampler)?;
        Ok(bound.samplers.get(name).cloned().flatten())
    }

    // ========================================================================
    // Param blocks
    // ========================================================================

    /// Replaces the buffer backing shareable block `name` in every stage.
    ///
    /// The new buffer is used as is: values cached by the material are not
    /// copied into it.
    pub fn set_param_block_buffer(
        &mut self,
        name: &str,
        buffer: Arc<GpuParamBlockBuffer>,
    ) -> Result<()> {
        let bound = self.bound_mut()?;
        if !bound.valid_shareable_param_blocks.contains(name) {
            return Err(Error::ParamBlockNotFound {
                name: name.to_string(),
            });
        }

        // Stages declaring the block as non-shareable keep their own buffer.
        let shared_block = |params: &GpuParams| {
            params
                .desc()
                .param_blocks
                .get(name)
                .filter(|block| block.is_shareable)
                .map(|block| block.block_size)
        };

        for block_size in bound.stages().filter_map(|params| shared_block(params)) {
            if buffer.size() < block_size {
                return Err(Error::ParamBlockSizeMismatch {
                    name: name.to_string(),
                    expected: block_size,
                    found: buffer.size(),
                });
            }
        }

        for params in bound
            .stages_mut()
            .filter(|params| shared_block(&**params).is_some())
        {
            params.set_param_block_buffer(name, Arc::clone(&buffer))?;
        }
        bound.shared_blocks.insert(name.to_string(), buffer);
        Ok(())
    }

    /// Every distinct block buffer bound to the material, in pass, stage and
    /// block-name order.
    #[must_use]
    pub fn param_block_buffers(&self) -> Vec<Arc<GpuParamBlockBuffer>> {
        let Some(bound) = &self.bound else {
            return Vec::new();
        };

        let mut seen = FxHashSet::default();
        let mut buffers = Vec::new();
        for params in bound.stages() {
            for name in params.desc().param_blocks.keys() {
                if let Some(buffer) = params.param_block_buffer(name)
                    && seen.insert(buffer.id())
                {
                    buffers.push(Arc::clone(buffer));
                }
            }
        }
        buffers
    }

    /// Uploads every dirty block buffer. Returns the number uploaded.
    pub fn update_param_blocks(&self, uploader: &mut dyn ParamBlockUploader) -> Result<usize> {
        let mut uploaded = 0;
        for buffer in self.param_block_buffers() {
            if buffer.update_if_dirty(uploader)? {
                uploaded += 1;
            }
        }
        Ok(uploaded)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Material parameter name → GPU variable name.
    pub fn valid_params(&self) -> Result<&FxHashMap<String, String>> {
        Ok(&self.bound()?.valid_params)
    }

    pub fn valid_shareable_param_blocks(&self) -> Result<&FxHashSet<String>> {
        Ok(&self.bound()?.valid_shareable_param_blocks)
    }

    /// Block holding GPU variable `gpu_name`.
    pub fn param_block_for(&self, gpu_name: &str) -> Result<Option<&str>> {
        Ok(self
            .bound()?
            .param_to_block
            .get(gpu_name)
            .map(String::as_str))
    }

    pub fn num_passes(&self) -> Result<usize> {
        Ok(self.bound()?.passes.len())
    }

    pub fn pass_parameters(&self, pass_idx: usize) -> Result<Option<&PassParameters>> {
        Ok(self.bound()?.passes.get(pass_idx))
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Captures every data parameter value.
    pub fn snapshot(&self) -> Result<MaterialSnapshot> {
        let bound = self.bound()?;
        Ok(MaterialSnapshot {
            shader: bound.shader.name().to_string(),
            values: bound
                .values
                .iter()
                .map(|(name, values)| (name.clone(), values.clone()))
                .collect(),
        })
    }

    /// Replays `snapshot` through the typed setters.
    ///
    /// Every entry is validated before anything is written. Entries may hold
    /// fewer elements than the parameter's array; the remaining elements keep
    /// their current values.
    pub fn apply_snapshot(&mut self, snapshot: &MaterialSnapshot) -> Result<()> {
        let bound = self.bound_mut()?;

        for (name, values) in &snapshot.values {
            match values {
                ParamValues::Float(v) => bound.check_values(name, v)?,
                ParamValues::Vec2(v) => bound.check_values(name, v)?,
                ParamValues::Vec3(v) => bound.check_values(name, v)?,
                ParamValues::Vec4(v) => bound.check_values(name, v)?,
                ParamValues::Mat3(v) => bound.check_values(name, v)?,
                ParamValues::Mat4(v) => bound.check_values(name, v)?,
                ParamValues::Struct(v) => bound.check_values(name, v)?,
            }
        }

        for (name, values) in &snapshot.values {
            match values {
                ParamValues::Float(v) => bound.set_values(name, v)?,
                ParamValues::Vec2(v) => bound.set_values(name, v)?,
                ParamValues::Vec3(v) => bound.set_values(name, v)?,
                ParamValues::Vec4(v) => bound.set_values(name, v)?,
                ParamValues::Mat3(v) => bound.set_values(name, v)?,
                ParamValues::Mat4(v) => bound.set_values(name, v)?,
                ParamValues::Struct(v) => bound.set_values(name, v)?,
            }
        }
        Ok(())
    }
}
