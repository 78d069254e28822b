use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::param_block::GpuParamBlockBuffer;
use super::param_desc::{GpuParamDataDesc, GpuParamDataType, GpuParamDesc, ParamKind};
use super::values::MaterialValue;
use crate::errors::{Error, Result};
use crate::resources::{SamplerState, Texture};

/// Parameter bindings of one GPU program.
///
/// Data parameters are written straight into the param block buffer bound to
/// their block; object parameters are held by reference.
#[derive(Debug)]
pub struct GpuParams {
    desc: Arc<GpuParamDesc>,
    param_blocks: FxHashMap<String, Arc<GpuParamBlockBuffer>>,
    textures: FxHashMap<String, Arc<Texture>>,
    samplers: FxHashMap<String, Arc<SamplerState>>,
}

impl GpuParams {
    #[must_use]
    pub fn new(desc: Arc<GpuParamDesc>) -> Self {
        Self {
            desc,
            param_blocks: FxHashMap::default(),
            textures: FxHashMap::default(),
            samplers: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &GpuParamDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.desc.params.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn has_texture(&self, name: &str) -> bool {
        self.desc.textures.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn has_sampler_state(&self, name: &str) -> bool {
        self.desc.samplers.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn has_param_block(&self, name: &str) -> bool {
        self.desc.param_blocks.contains_key(name)
    }

    /// Binds `buffer` to block `name`. The buffer must be at least as large
    /// as the block.
    pub fn set_param_block_buffer(
        &mut self,
        name: &str,
        buffer: Arc<GpuParamBlockBuffer>,
    ) -> Result<()> {
        let block = self
            .desc
            .param_blocks
            .get(name)
            .ok_or_else(|| Error::ParamBlockNotFound {
                name: name.to_string(),
            })?;

        if buffer.size() < block.block_size {
            return Err(Error::ParamBlockSizeMismatch {
                name: name.to_string(),
                expected: block.block_size,
                found: buffer.size(),
            });
        }

        self.param_blocks.insert(name.to_string(), buffer);
        Ok(())
    }

    #[must_use]
    pub fn param_block_buffer(&self, name: &str) -> Option<&Arc<GpuParamBlockBuffer>> {
        self.param_blocks.get(name)
    }

    pub fn param_block_buffers(&self) -> impl Iterator<Item = (&str, &Arc<GpuParamBlockBuffer>)> {
        self.param_blocks.iter().map(|(name, buffer)| (name.as_str(), buffer))
    }

    /// Writes element `array_idx` of data parameter `name`.
    pub fn set_param<T: MaterialValue>(&self, name: &str, value: &T, array_idx: u32) -> Result<()> {
        let (offset, buffer) = self.resolve_write(name, value, array_idx)?;
        buffer.write(offset, &value.to_gpu_bytes())
    }

    /// Checks everything [`GpuParams::set_param`] checks, without writing.
    pub fn validate_param<T: MaterialValue>(&self, name: &str, value: &T, array_idx: u32) -> Result<()> {
        self.resolve_write(name, value, array_idx).map(|_| ())
    }

    /// Reads element `array_idx` of data parameter `name` back from its block.
    pub fn get_param<T: MaterialValue>(&self, name: &str, array_idx: u32) -> Result<T> {
        let (param, buffer) = self.resolve::<T>(name, array_idx)?;
        let bytes = buffer.read(param.element_offset(array_idx), param.element_size)?;
        Ok(T::from_gpu_bytes(&bytes))
    }

    pub fn set_texture(&mut self, name: &str, texture: Option<Arc<Texture>>) -> Result<()> {
        if !self.has_texture(name) {
            return Err(Error::ParamNotFound {
                name: name.to_string(),
            });
        }
        match texture {
            Some(texture) => self.textures.insert(name.to_string(), texture),
            None => self.textures.remove(name),
        };
        Ok(())
    }

    #[must_use]
    pub fn texture(&self, name: &str) -> Option<&Arc<Texture>> {
        self.textures.get(name)
    }

    pub fn set_sampler_state(
        &mut self,
        name: &str,
        sampler: Option<Arc<SamplerState>>,
    ) -> Result<()> {
        if !self.has_sampler_state(name) {
            return Err(Error::ParamNotFound {
                name: name.to_string(),
            });
        }
        match sampler {
            Some(sampler) => self.samplers.insert(name.to_string(), sampler),
            None => self.samplers.remove(name),
        };
        Ok(())
    }

    #[must_use]
    pub fn sampler_state(&self, name: &str) -> Option<&Arc<SamplerState>> {
        self.samplers.get(name)
    }

    fn resolve_write<T: MaterialValue>(
        &self,
        name: &str,
        value: &T,
        array_idx: u32,
    ) -> Result<(u32, &Arc<GpuParamBlockBuffer>)> {
        let (param, buffer) = self.resolve::<T>(name, array_idx)?;

        if T::DATA_TYPE == GpuParamDataType::Struct {
            let size = value.to_gpu_bytes().len() as u32;
            if size != param.element_size {
                return Err(Error::StructSizeMismatch {
                    name: name.to_string(),
                    expected: param.element_size,
                    found: size,
                });
            }
        }

        let offset = param.element_offset(array_idx);
        if offset.saturating_add(param.element_size) > buffer.size() {
            return Err(Error::ParamBlockOverflow {
                offset,
                len: param.element_size,
                size: buffer.size(),
            });
        }

        Ok((offset, buffer))
    }

    fn resolve<T: MaterialValue>(
        &self,
        name: &str,
        array_idx: u32,
    ) -> Result<(&GpuParamDataDesc, &Arc<GpuParamBlockBuffer>)> {
        let param = self
            .desc
            .params
            .get(name)
            .ok_or_else(|| Error::ParamNotFound {
                name: name.to_string(),
            })?;

        if param.param_type != T::DATA_TYPE {
            return Err(Error::ParamTypeMismatch {
                name: name.to_string(),
                expected: ParamKind::Data(T::DATA_TYPE),
                found: ParamKind::Data(param.param_type),
            });
        }

        if let Some(expected) = param.param_type.element_size()
            && expected != param.element_size
        {
            return Err(Error::ElementSizeMismatch {
                name: name.to_string(),
                param_type: param.param_type,
                expected,
                found: param.element_size,
            });
        }

        if array_idx >= param.array_size {
            return Err(Error::ArrayIndexOutOfRange {
                name: name.to_string(),
                index: array_idx,
                size: param.array_size,
            });
        }

        let buffer = self
            .param_blocks
            .get(&param.param_block)
            .ok_or_else(|| Error::ParamBlockNotFound {
                name: param.param_block.clone(),
            })?;

        Ok((param, buffer))
    }
}
