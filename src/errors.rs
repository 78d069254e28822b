//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`Error`] covers four families of failure, exposed
//! through [`Error::kind`] so callers can branch without inspecting messages:
//!
//! - [`ErrorKind::InvalidConfiguration`]: a surface set, view range or
//!   parameter layout that can never work. Variants carry both the expected
//!   and the actual value.
//! - [`ErrorKind::NotSupported`]: a capability that exists in the API but is
//!   not implemented.
//! - [`ErrorKind::ContractViolation`]: a caller bug (reading an unfinished
//!   [`AsyncOp`](crate::core_thread::AsyncOp), over-releasing a view, using a
//!   material before a shader is bound).
//! - [`ErrorKind::NotFound`]: an unknown parameter name.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, Error>`.
//!
//! ```rust,ignore
//! use tessera::errors::{Error, ErrorKind};
//!
//! match material.set_float("roughness", 0.5, 0) {
//!     Err(e) if e.kind() == ErrorKind::NotFound => log::warn!("{e}"),
//!     other => other?,
//! }
//! ```

use std::fmt;

use thiserror::Error;

use crate::material::param_desc::{GpuParamDataType, ParamKind};
use crate::render_target::SurfaceProperties;
use crate::resources::texture::{TextureType, TextureUsage};

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidConfiguration,
    NotSupported,
    ContractViolation,
    NotFound,
    Device,
}

/// Identifies which surface of a multi render target failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceSlot {
    Color(usize),
    DepthStencil,
}

impl fmt::Display for SurfaceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(idx) => write!(f, "color surface {idx}"),
            Self::DepthStencil => f.write_str("depth/stencil surface"),
        }
    }
}

/// Caller bugs.
///
/// These are never expected in a correct program. They are logged and
/// turned into a panic in debug builds (see [`contract_violation`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("AsyncOp return value requested before the operation completed")]
    OperationNotCompleted,

    #[error("AsyncOp completed more than once")]
    OperationAlreadyCompleted,

    #[error("AsyncOp return value type mismatch: stored {found}, requested {expected}")]
    ResultTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("resource view {view} released but it is not held by the cache (over-release or foreign view)")]
    ViewNotCached { view: String },

    #[error("material accessed before a shader was bound")]
    MaterialNotInitialized,
}

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Invalid configuration
    // ========================================================================
    /// Texture was not created with the usage a surface requires.
    #[error("{surface}: texture usage is {found:?}, expected {expected:?}")]
    InvalidUsage {
        surface: SurfaceSlot,
        expected: TextureUsage,
        found: TextureUsage,
    },

    /// A surface disagrees with the first color surface.
    #[error(
        "{surface} doesn't match the first color surface: \
         width {}/{}, height {}/{}, multisample count {}/{}, multisample hint '{}'/'{}'",
        .found.width, .expected.width,
        .found.height, .expected.height,
        .found.multisample_count, .expected.multisample_count,
        .found.multisample_hint, .expected.multisample_hint
    )]
    SurfaceMismatch {
        surface: SurfaceSlot,
        expected: SurfaceProperties,
        found: SurfaceProperties,
    },

    /// Render textures only support plain 2D surfaces.
    #[error("render textures are only implemented for 2D surfaces, got {found:?}")]
    UnsupportedTextureType { found: TextureType },

    /// Face / array slice range exceeds the texture.
    #[error("face range out of bounds: requested up to face {requested}, texture has {available}")]
    FaceOutOfRange { requested: u32, available: u32 },

    /// Mip level exceeds the texture's mip chain.
    #[error("mip level out of bounds: requested {requested}, texture has {available} levels")]
    MipOutOfRange { requested: u32, available: u32 },

    /// Buffer view element range exceeds the buffer.
    #[error("element range {first}..{end} out of bounds for buffer with {available} elements")]
    ElementRangeOutOfBounds { first: u32, end: u32, available: u32 },

    /// No technique of the shader runs on the active device.
    #[error("shader '{shader}' has no technique supported by render system '{render_system}'")]
    NoSupportedTechnique {
        shader: String,
        render_system: String,
    },

    /// Value kind doesn't match the declared parameter type.
    #[error("parameter '{name}' is {found}, accessed as {expected}")]
    ParamTypeMismatch {
        name: String,
        expected: ParamKind,
        found: ParamKind,
    },

    /// Array index past the declared array size.
    #[error("parameter '{name}' array index {index} out of range (size {size})")]
    ArrayIndexOutOfRange { name: String, index: u32, size: u32 },

    /// Struct value size disagrees with the declared element size.
    #[error("parameter '{name}' expects {expected} bytes, got {found}")]
    StructSizeMismatch {
        name: String,
        expected: u32,
        found: u32,
    },

    /// Reflected element size disagrees with the size of the parameter's type.
    #[error("parameter '{name}' is {param_type:?} ({expected} bytes) but declares {found}-byte elements")]
    ElementSizeMismatch {
        name: String,
        param_type: GpuParamDataType,
        expected: u32,
        found: u32,
    },

    /// Param block buffer doesn't fit the block it is bound to.
    #[error("param block '{name}' needs {expected} bytes, buffer has {found}")]
    ParamBlockSizeMismatch {
        name: String,
        expected: u32,
        found: u32,
    },

    /// A write or read past the end of a param block.
    #[error("param block access {offset}+{len} exceeds block size {size}")]
    ParamBlockOverflow { offset: u32, len: u32, size: u32 },

    // ========================================================================
    // Unimplemented capability
    // ========================================================================
    /// The operation exists in the API but has no implementation.
    #[error("not supported: {0}")]
    NotSupported(&'static str),

    // ========================================================================
    // Programming-contract violations
    // ========================================================================
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    // ========================================================================
    // Not found
    // ========================================================================
    /// Unknown data or object parameter name.
    #[error("material has no parameter named '{name}'")]
    ParamNotFound { name: String },

    /// Unknown param block name.
    #[error("material has no param block named '{name}'")]
    ParamBlockNotFound { name: String },

    // ========================================================================
    // Device
    // ========================================================================
    /// Reported by a device backend.
    #[error("device error: {0}")]
    Device(String),

    /// The render thread is gone.
    #[error("render thread is no longer accepting commands")]
    CoreThreadStopped,
}

impl Error {
    /// Classification used for branching.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUsage { .. }
            | Self::SurfaceMismatch { .. }
            | Self::UnsupportedTextureType { .. }
            | Self::FaceOutOfRange { .. }
            | Self::MipOutOfRange { .. }
            | Self::ElementRangeOutOfBounds { .. }
            | Self::NoSupportedTechnique { .. }
            | Self::ParamTypeMismatch { .. }
            | Self::ArrayIndexOutOfRange { .. }
            | Self::StructSizeMismatch { .. }
            | Self::ElementSizeMismatch { .. }
            | Self::ParamBlockSizeMismatch { .. }
            | Self::ParamBlockOverflow { .. } => ErrorKind::InvalidConfiguration,
            Self::NotSupported(_) => ErrorKind::NotSupported,
            Self::Contract(_) => ErrorKind::ContractViolation,
            Self::ParamNotFound { .. } | Self::ParamBlockNotFound { .. } => ErrorKind::NotFound,
            Self::Device(_) | Self::CoreThreadStopped => ErrorKind::Device,
        }
    }
}

/// Reports a caller bug.
///
/// Logs the violation and panics in debug builds. Release builds get the
/// error back so the caller can bail out.
#[track_caller]
pub fn contract_violation(violation: ContractViolation) -> Error {
    log::error!("Contract violation: {violation}");
    if cfg!(debug_assertions) {
        panic!("contract violation: {violation}");
    }
    Error::Contract(violation)
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
