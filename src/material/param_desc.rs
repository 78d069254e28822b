//! GPU Parameter Descriptions
//!
//! Reflection data a compiled GPU program exposes: data parameters living in
//! param blocks, object parameters (textures, samplers, buffers) and the
//! blocks themselves. Offsets and sizes are in bytes; data parameter offsets
//! are relative to the start of their block.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Element type of a data parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuParamDataType {
    Float1,
    Float2,
    Float3,
    Float4,
    Matrix3x3,
    Matrix4x4,
    Struct,
}

impl GpuParamDataType {
    /// Size of one element in GPU memory, `None` for structs.
    ///
    /// 3x3 matrices occupy three 16-byte columns.
    #[must_use]
    pub const fn element_size(self) -> Option<u32> {
        match self {
            Self::Float1 => Some(4),
            Self::Float2 => Some(8),
            Self::Float3 => Some(12),
            Self::Float4 => Some(16),
            Self::Matrix3x3 => Some(48),
            Self::Matrix4x4 => Some(64),
            Self::Struct => None,
        }
    }
}

/// Object parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuParamObjectType {
    Sampler1d,
    Sampler2d,
    Sampler3d,
    SamplerCube,
    Texture1d,
    Texture2d,
    Texture3d,
    TextureCube,
    ByteBuffer,
    StructuredBuffer,
    RwStructuredBuffer,
}

impl GpuParamObjectType {
    #[inline]
    #[must_use]
    pub fn is_sampler(self) -> bool {
        matches!(
            self,
            Self::Sampler1d | Self::Sampler2d | Self::Sampler3d | Self::SamplerCube
        )
    }

    #[inline]
    #[must_use]
    pub fn is_texture(self) -> bool {
        matches!(
            self,
            Self::Texture1d | Self::Texture2d | Self::Texture3d | Self::TextureCube
        )
    }

    #[inline]
    #[must_use]
    pub fn is_buffer(self) -> bool {
        matches!(
            self,
            Self::ByteBuffer | Self::StructuredBuffer | Self::RwStructuredBuffer
        )
    }

    #[must_use]
    pub fn kind(self) -> ParamKind {
        if self.is_sampler() {
            ParamKind::Sampler
        } else if self.is_texture() {
            ParamKind::Texture
        } else {
            ParamKind::Buffer
        }
    }
}

/// What a named material parameter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Data(GpuParamDataType),
    Texture,
    Sampler,
    Buffer,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(ty) => write!(f, "{ty:?}"),
            Self::Texture => f.write_str("a texture"),
            Self::Sampler => f.write_str("a sampler state"),
            Self::Buffer => f.write_str("a buffer"),
        }
    }
}

/// A data parameter stored in a param block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpuParamDataDesc {
    pub name: String,
    pub param_type: GpuParamDataType,
    /// `1` for non-array parameters.
    pub array_size: u32,
    pub element_size: u32,
    pub array_element_stride: u32,
    pub param_block: String,
    pub gpu_mem_offset: u32,
}

impl GpuParamDataDesc {
    /// Single non-struct value at `offset` inside `block`.
    ///
    /// # Panics
    ///
    /// On [`GpuParamDataType::Struct`], use [`GpuParamDataDesc::structure`].
    #[must_use]
    pub fn new(name: &str, param_type: GpuParamDataType, block: &str, offset: u32) -> Self {
        let element_size = param_type
            .element_size()
            .expect("struct parameters need an explicit size");
        Self {
            name: name.to_string(),
            param_type,
            array_size: 1,
            element_size,
            array_element_stride: element_size,
            param_block: block.to_string(),
            gpu_mem_offset: offset,
        }
    }

    /// Single struct of `size` bytes.
    #[must_use]
    pub fn structure(name: &str, size: u32, block: &str, offset: u32) -> Self {
        Self {
            name: name.to_string(),
            param_type: GpuParamDataType::Struct,
            array_size: 1,
            element_size: size,
            array_element_stride: size,
            param_block: block.to_string(),
            gpu_mem_offset: offset,
        }
    }

    /// Turns the parameter into an array; elements start on 16-byte boundaries.
    #[must_use]
    pub fn array(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self.array_element_stride = self.element_size.next_multiple_of(16);
        self
    }

    /// Byte offset of element `array_idx` inside the block.
    #[inline]
    #[must_use]
    pub fn element_offset(&self, array_idx: u32) -> u32 {
        self.gpu_mem_offset + array_idx * self.array_element_stride
    }

    /// Bytes spanned from the first element to the end of the last.
    #[inline]
    #[must_use]
    pub fn byte_span(&self) -> u32 {
        self.array_size.saturating_sub(1) * self.array_element_stride + self.element_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpuParamObjectDesc {
    pub name: String,
    pub object_type: GpuParamObjectType,
    pub slot: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpuParamBlockDesc {
    pub name: String,
    pub slot: u32,
    pub block_size: u32,
    /// Whether one buffer may back this block in every stage that declares it.
    pub is_shareable: bool,
}

/// Everything one GPU program exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuParamDesc {
    pub params: BTreeMap<String, GpuParamDataDesc>,
    pub samplers: BTreeMap<String, GpuParamObjectDesc>,
    pub textures: BTreeMap<String, GpuParamObjectDesc>,
    pub buffers: BTreeMap<String, GpuParamObjectDesc>,
    pub param_blocks: BTreeMap<String, GpuParamBlockDesc>,
}

impl GpuParamDesc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_block(mut self, name: &str, slot: u32, block_size: u32, is_shareable: bool) -> Self {
        self.param_blocks.insert(
            name.to_string(),
            GpuParamBlockDesc {
                name: name.to_string(),
                slot,
                block_size,
                is_shareable,
            },
        );
        self
    }

    #[must_use]
    pub fn with_param(mut self, param: GpuParamDataDesc) -> Self {
        self.params.insert(param.name.clone(), param);
        self
    }

    /// Adds an object parameter to the table matching its kind.
    #[must_use]
    pub fn with_object(mut self, name: &str, object_type: GpuParamObjectType, slot: u32) -> Self {
        let desc = GpuParamObjectDesc {
            name: name.to_string(),
            object_type,
            slot,
        };
        let table = if object_type.is_sampler() {
            &mut self.samplers
        } else if object_type.is_texture() {
            &mut self.textures
        } else {
            &mut self.buffers
        };
        table.insert(name.to_string(), desc);
        self
    }

    /// Looks up an object parameter of any kind.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&GpuParamObjectDesc> {
        self.samplers
            .get(name)
            .or_else(|| self.textures.get(name))
            .or_else(|| self.buffers.get(name))
    }

    pub fn objects(&self) -> impl Iterator<Item = &GpuParamObjectDesc> {
        self.samplers
            .values()
            .chain(self.textures.values())
            .chain(self.buffers.values())
    }

    /// Data parameters of `block`, in memory order.
    #[must_use]
    pub fn block_members(&self, block: &str) -> Vec<&GpuParamDataDesc> {
        let mut members: Vec<_> = self
            .params
            .values()
            .filter(|param| param.param_block == block)
            .collect();
        members.sort_by_key(|param| param.gpu_mem_offset);
        members
    }
}

/// Compares two data parameters.
///
/// Type, array size, element size and array stride must match. Offsets are
/// compared too unless `ignore_buffer_offsets` is set.
#[must_use]
pub fn are_params_equal(
    a: &GpuParamDataDesc,
    b: &GpuParamDataDesc,
    ignore_buffer_offsets: bool,
) -> bool {
    let layout_equal = a.param_type == b.param_type
        && a.array_size == b.array_size
        && a.element_size == b.element_size
        && a.array_element_stride == b.array_element_stride;

    layout_equal && (ignore_buffer_offsets || a.gpu_mem_offset == b.gpu_mem_offset)
}
