//! Async Operations
//!
//! An [`AsyncOp`] is a single-assignment cell shared between the thread that
//! issues a request and the thread that executes it. Clones share the cell.
//!
//! ```text
//!  producer                         render thread
//!  ────────                         ─────────────
//!  op = queue_return_command(..) ──► command runs
//!  op.has_completed() == false      op.complete_operation(value)
//!  op.wait()  ◄───────────────────── completed.store(true, Release)
//!  op.return_value::<u32>()
//! ```
//!
//! Results are stored as an [`AsyncValue`]. Reading with the wrong type is a
//! contract violation, no conversion is attempted.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::errors::{ContractViolation, Result, contract_violation};

// ---------------------------------------------------------------------------
// AsyncValue
// ---------------------------------------------------------------------------

/// Result produced by an asynchronous operation.
#[derive(Clone, Default)]
pub enum AsyncValue {
    /// Completed without a value.
    #[default]
    None,
    Bool(bool),
    I32(i32),
    U32(u32),
    U64(u64),
    F32(f32),
    String(String),
    Bytes(Vec<u8>),
    /// Anything else, downcast with [`AsyncOp::return_object`].
    Object(Arc<dyn Any + Send + Sync>),
}

impl AsyncValue {
    /// Name of the stored kind, used in mismatch reports.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "()",
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::String(_) => "String",
            Self::Bytes(_) => "Vec<u8>",
            Self::Object(_) => "object",
        }
    }

    /// Wraps an arbitrary value.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Arc::new(value))
    }
}

impl fmt::Debug for AsyncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::I32(v) => f.debug_tuple("I32").field(v).finish(),
            Self::U32(v) => f.debug_tuple("U32").field(v).finish(),
            Self::U64(v) => f.debug_tuple("U64").field(v).finish(),
            Self::F32(v) => f.debug_tuple("F32").field(v).finish(),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Typed extraction from an [`AsyncValue`].
pub trait FromAsyncValue: Sized {
    const TYPE_NAME: &'static str;

    /// Returns `None` when `value` holds a different kind.
    fn from_async_value(value: &AsyncValue) -> Option<Self>;
}

macro_rules! impl_async_value {
    ($($ty:ty => $variant:ident, $name:literal);* $(;)?) => {
        $(
            impl From<$ty> for AsyncValue {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl FromAsyncValue for $ty {
                const TYPE_NAME: &'static str = $name;

                #[inline]
                fn from_async_value(value: &AsyncValue) -> Option<Self> {
                    match value {
                        AsyncValue::$variant(v) => Some(Clone::clone(v)),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_async_value! {
    bool => Bool, "bool";
    i32 => I32, "i32";
    u32 => U32, "u32";
    u64 => U64, "u64";
    f32 => F32, "f32";
    String => String, "String";
    Vec<u8> => Bytes, "Vec<u8>";
}

impl From<()> for AsyncValue {
    #[inline]
    fn from((): ()) -> Self {
        Self::None
    }
}

impl From<&str> for AsyncValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl FromAsyncValue for () {
    const TYPE_NAME: &'static str = "()";

    #[inline]
    fn from_async_value(value: &AsyncValue) -> Option<Self> {
        matches!(value, AsyncValue::None).then_some(())
    }
}

// ---------------------------------------------------------------------------
// AsyncOp
// ---------------------------------------------------------------------------

#[derive(Default)]
struct AsyncOpInner {
    completed: AtomicBool,
    value: Mutex<Option<AsyncValue>>,
    signal: Condvar,
}

/// Handle to an operation that completes on another thread.
#[derive(Clone, Default)]
pub struct AsyncOp {
    inner: Arc<AsyncOpInner>,
}

impl AsyncOp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the result and marks the operation complete.
    ///
    /// Must be called exactly once per operation.
    pub fn complete_operation(&self, value: impl Into<AsyncValue>) -> Result<()> {
        let mut slot = self.inner.value.lock();
        if self.inner.completed.load(Ordering::Acquire) {
            return Err(contract_violation(
                ContractViolation::OperationAlreadyCompleted,
            ));
        }

        *slot = Some(value.into());
        self.inner.completed.store(true, Ordering::Release);
        drop(slot);

        self.inner.signal.notify_all();
        Ok(())
    }

    /// Completes the operation without a value.
    #[inline]
    pub fn complete(&self) -> Result<()> {
        self.complete_operation(AsyncValue::None)
    }

    #[inline]
    #[must_use]
    pub fn has_completed(&self) -> bool {
        self.inner.completed.load(Ordering::Acquire)
    }

    /// Returns a copy of the stored result.
    pub fn return_value<T: FromAsyncValue>(&self) -> Result<T> {
        self.with_value(|value| {
            T::from_async_value(value).ok_or_else(|| {
                contract_violation(ContractViolation::ResultTypeMismatch {
                    expected: T::TYPE_NAME,
                    found: value.type_name(),
                })
            })
        })
    }

    /// Returns the stored [`AsyncValue::Object`] downcast to `T`.
    pub fn return_object<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.with_value(|value| {
            let mismatch = || {
                contract_violation(ContractViolation::ResultTypeMismatch {
                    expected: std::any::type_name::<T>(),
                    found: value.type_name(),
                })
            };
            match value {
                AsyncValue::Object(object) => {
                    Arc::clone(object).downcast::<T>().map_err(|_| mismatch())
                }
                _ => Err(mismatch()),
            }
        })
    }

    /// Blocks the calling thread until the operation completes.
    pub fn wait(&self) {
        let mut slot = self.inner.value.lock();
        while !self.inner.completed.load(Ordering::Acquire) {
            self.inner.signal.wait(&mut slot);
        }
    }

    fn with_value<T>(&self, f: impl FnOnce(&AsyncValue) -> Result<T>) -> Result<T> {
        if !self.has_completed() {
            return Err(contract_violation(ContractViolation::OperationNotCompleted));
        }

        let slot = self.inner.value.lock();
        match slot.as_ref() {
            Some(value) => f(value),
            None => Err(contract_violation(ContractViolation::OperationNotCompleted)),
        }
    }
}

impl fmt::Debug for AsyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncOp")
            .field("completed", &self.has_completed())
            .finish_non_exhaustive()
    }
}
