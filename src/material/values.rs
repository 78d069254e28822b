//! Material Parameter Values
//!
//! CPU-side values a material can assign to data parameters, and the GPU
//! byte layout each one is written with.
//!
//! | Value        | GPU type    | Bytes | Layout                         |
//! |--------------|-------------|-------|--------------------------------|
//! | `f32`        | `Float1`    | 4     | as is                          |
//! | `Vec2`       | `Float2`    | 8     | as is                          |
//! | `Vec3`       | `Float3`    | 12    | as is                          |
//! | `Vec4`       | `Float4`    | 16    | as is                          |
//! | `Mat3`       | `Matrix3x3` | 48    | column-major, columns padded   |
//! | `Mat4`       | `Matrix4x4` | 64    | column-major                   |
//! | `StructData` | `Struct`    | n     | raw bytes, size must match     |

use std::borrow::Cow;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::param_desc::GpuParamDataType;

/// Opaque bytes written to a struct parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StructData {
    data: Vec<u8>,
}

impl StructData {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Copies any plain-old-data value.
    #[must_use]
    pub fn from_pod<T: bytemuck::Pod>(value: &T) -> Self {
        Self {
            data: bytemuck::bytes_of(value).to_vec(),
        }
    }

    #[must_use]
    pub fn zeroed(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A value type that can be stored in a material data parameter.
pub trait MaterialValue: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    const DATA_TYPE: GpuParamDataType;

    /// Bytes written to GPU memory for one element.
    fn to_gpu_bytes(&self) -> Cow<'_, [u8]>;

    /// Decodes one element from `bytes`, which spans the element size.
    fn from_gpu_bytes(bytes: &[u8]) -> Self;

    fn cache(values: &ParamValues) -> Option<&[Self]>;

    fn cache_mut(values: &mut ParamValues) -> Option<&mut [Self]>;
}

macro_rules! impl_pod_value {
    ($($ty:ty => $data_type:ident, $variant:ident);* $(;)?) => {
        $(
            impl MaterialValue for $ty {
                const DATA_TYPE: GpuParamDataType = GpuParamDataType::$data_type;

                #[inline]
                fn to_gpu_bytes(&self) -> Cow<'_, [u8]> {
                    Cow::Borrowed(bytemuck::bytes_of(self))
                }

                #[inline]
                fn from_gpu_bytes(bytes: &[u8]) -> Self {
                    bytemuck::pod_read_unaligned(&bytes[..std::mem::size_of::<$ty>()])
                }

                #[inline]
                fn cache(values: &ParamValues) -> Option<&[Self]> {
                    match values {
                        ParamValues::$variant(v) => Some(v.as_slice()),
                        _ => None,
                    }
                }

                #[inline]
                fn cache_mut(values: &mut ParamValues) -> Option<&mut [Self]> {
                    match values {
                        ParamValues::$variant(v) => Some(v.as_mut_slice()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_pod_value! {
    f32 => Float1, Float;
    Vec2 => Float2, Vec2;
    Vec3 => Float3, Vec3;
    Vec4 => Float4, Vec4;
    Mat4 => Matrix4x4, Mat4;
}

impl MaterialValue for Mat3 {
    const DATA_TYPE: GpuParamDataType = GpuParamDataType::Matrix3x3;

    fn to_gpu_bytes(&self) -> Cow<'_, [u8]> {
        let padded = [
            self.x_axis.extend(0.0),
            self.y_axis.extend(0.0),
            self.z_axis.extend(0.0),
        ];
        Cow::Owned(bytemuck::cast_slice::<Vec4, u8>(&padded).to_vec())
    }

    fn from_gpu_bytes(bytes: &[u8]) -> Self {
        let column = |idx: usize| Vec3::from_gpu_bytes(&bytes[idx * 16..]);
        Self::from_cols(column(0), column(1), column(2))
    }

    fn cache(values: &ParamValues) -> Option<&[Self]> {
        match values {
            ParamValues::Mat3(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    fn cache_mut(values: &mut ParamValues) -> Option<&mut [Self]> {
        match values {
            ParamValues::Mat3(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }
}

impl MaterialValue for StructData {
    const DATA_TYPE: GpuParamDataType = GpuParamDataType::Struct;

    fn to_gpu_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.data)
    }

    fn from_gpu_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    fn cache(values: &ParamValues) -> Option<&[Self]> {
        match values {
            ParamValues::Struct(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    fn cache_mut(values: &mut ParamValues) -> Option<&mut [Self]> {
        match values {
            ParamValues::Struct(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }
}

/// Cached values of one data parameter, one entry per array element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValues {
    Float(Vec<f32>),
    Vec2(Vec<Vec2>),
    Vec3(Vec<Vec3>),
    Vec4(Vec<Vec4>),
    Mat3(Vec<Mat3>),
    Mat4(Vec<Mat4>),
    Struct(Vec<StructData>),
}

impl ParamValues {
    /// Cache matching a zero-filled block: `array_size` zero elements.
    #[must_use]
    pub fn zeroed(data_type: GpuParamDataType, array_size: u32, element_size: u32) -> Self {
        let len = array_size as usize;
        match data_type {
            GpuParamDataType::Float1 => Self::Float(vec![0.0; len]),
            GpuParamDataType::Float2 => Self::Vec2(vec![Vec2::ZERO; len]),
            GpuParamDataType::Float3 => Self::Vec3(vec![Vec3::ZERO; len]),
            GpuParamDataType::Float4 => Self::Vec4(vec![Vec4::ZERO; len]),
            GpuParamDataType::Matrix3x3 => Self::Mat3(vec![Mat3::ZERO; len]),
            GpuParamDataType::Matrix4x4 => Self::Mat4(vec![Mat4::ZERO; len]),
            GpuParamDataType::Struct => {
                Self::Struct(vec![StructData::zeroed(element_size as usize); len])
            }
        }
    }

    #[must_use]
    pub fn data_type(&self) -> GpuParamDataType {
        match self {
            Self::Float(_) => GpuParamDataType::Float1,
            Self::Vec2(_) => GpuParamDataType::Float2,
            Self::Vec3(_) => GpuParamDataType::Float3,
            Self::Vec4(_) => GpuParamDataType::Float4,
            Self::Mat3(_) => GpuParamDataType::Matrix3x3,
            Self::Mat4(_) => GpuParamDataType::Matrix4x4,
            Self::Struct(_) => GpuParamDataType::Struct,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
            Self::Mat3(v) => v.len(),
            Self::Mat4(v) => v.len(),
            Self::Struct(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
