//! Convention-aware invocation
//!
//! The dispatcher switches on the registered tag:
//! - `DirectPointer` - transmute to the exact `extern "C"` shape and call
//! - `ManagedTrampoline` - box arguments into `RawValue` slots and call the
//!   uniform trampoline
//! - `Managed` - call the Rust closure

use super::abi::CallingConvention;
use super::marshal::{check_args, from_raw, marshal_args};
use super::types::{NativeType, NativeValue, RawValue, Signature};
use super::{record, Counter};
use crate::altrep::OperationKind;
use crate::error::{InteropError, Result};
use crate::logging::{log_native_call, log_native_error, log_native_return};
use core::ffi::c_void;
use std::fmt;
use std::sync::Arc;

/// Rust implementation of an operation
pub type ManagedFn = Arc<dyn Fn(&[NativeValue]) -> Result<NativeValue> + Send + Sync>;

/// Uniform boxed-argument trampoline; non-zero status is a failure
pub type TrampolineFn =
    unsafe extern "C" fn(args: *const RawValue, nargs: usize, ret: *mut RawValue) -> i32;

/// Code that implements an operation
#[derive(Clone)]
pub enum EntryPoint {
    Native(*const c_void),
    Managed(ManagedFn),
}

// Native entry points are immutable code addresses.
unsafe impl Send for EntryPoint {}
unsafe impl Sync for EntryPoint {}

impl EntryPoint {
    /// Wrap a native code address
    ///
    /// # Safety
    /// `ptr` must stay callable for as long as any table holds it, and must
    /// have the shape demanded by the convention it is registered under:
    /// the operation's exact C signature for `DirectPointer`, or
    /// [`TrampolineFn`] for `ManagedTrampoline`.
    #[inline]
    pub unsafe fn native(ptr: *const c_void) -> Self {
        Self::Native(ptr)
    }

    /// Wrap a Rust closure
    pub fn managed<F>(f: F) -> Self
    where
        F: Fn(&[NativeValue]) -> Result<NativeValue> + Send + Sync + 'static,
    {
        Self::Managed(Arc::new(f))
    }

    /// Code address for native entries
    #[inline]
    pub fn address(&self) -> Option<usize> {
        match self {
            Self::Native(ptr) => Some(*ptr as usize),
            Self::Managed(_) => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Native(ptr) if ptr.is_null())
    }

    /// Whether this entry can be invoked under `tag`
    #[inline]
    pub fn accepts(&self, tag: CallingConvention) -> bool {
        match self {
            Self::Native(_) => tag.is_native(),
            Self::Managed(_) => !tag.is_native(),
        }
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(ptr) => write!(f, "Native({:p})", *ptr),
            Self::Managed(_) => f.write_str("Managed(..)"),
        }
    }
}

/// One resolved call: entry point, tag and signature
pub struct FunctionCall<'a> {
    kind: OperationKind,
    entry: &'a EntryPoint,
    convention: CallingConvention,
    signature: Signature,
}

impl<'a> FunctionCall<'a> {
    #[inline]
    pub fn new(
        kind: OperationKind,
        entry: &'a EntryPoint,
        convention: CallingConvention,
        signature: Signature,
    ) -> Self {
        Self {
            kind,
            entry,
            convention,
            signature,
        }
    }

    /// Validate arguments, dispatch on the convention, validate the result
    pub fn call(&self, args: &[NativeValue]) -> Result<NativeValue> {
        check_args(&self.signature, args)?;

        log_native_call(self.kind.name(), self.convention.name(), args.len());
        record(Counter::NativeCalls);

        let result = match (self.convention, self.entry) {
            (CallingConvention::Managed, EntryPoint::Managed(f)) => f(args),
            (CallingConvention::DirectPointer, EntryPoint::Native(ptr)) if !ptr.is_null() => {
                // SAFETY: guaranteed by the `EntryPoint::native` contract.
                unsafe { self.call_direct(*ptr, args) }
            }
            (CallingConvention::ManagedTrampoline, EntryPoint::Native(ptr))
                if !ptr.is_null() =>
            {
                // SAFETY: guaranteed by the `EntryPoint::native` contract.
                unsafe { self.call_trampoline(*ptr, args) }
            }
            (tag, EntryPoint::Native(ptr)) if ptr.is_null() && tag.is_native() => {
                Err(InteropError::NullEntryPoint { kind: self.kind })
            }
            (tag, _) => Err(InteropError::ConventionMismatch { kind: self.kind, tag }),
        };

        match result {
            Ok(value) if value.ty() != self.signature.ret => {
                let err = InteropError::ReturnTypeMismatch {
                    kind: self.kind,
                    expected: self.signature.ret,
                    found: value.ty(),
                };
                log_native_error(self.kind.name(), &err.to_string());
                Err(err)
            }
            Ok(value) => {
                log_native_return(self.kind.name());
                Ok(value)
            }
            Err(err) => {
                log_native_error(self.kind.name(), &err.to_string());
                Err(err)
            }
        }
    }

    /// Trampoline call: boxed arguments, status code, boxed return
    unsafe fn call_trampoline(&self, ptr: *const c_void, args: &[NativeValue]) -> Result<NativeValue> {
        let raw_args = marshal_args(args);
        let mut ret = RawValue::zeroed();

        let trampoline: TrampolineFn = core::mem::transmute(ptr);
        let status = trampoline(raw_args.as_ptr(), raw_args.len(), &mut ret);

        if status != 0 {
            record(Counter::TrampolineFailures);
            return Err(InteropError::TrampolineFailed {
                kind: self.kind,
                status,
            });
        }
        Ok(from_raw(ret, self.signature.ret))
    }

    /// Direct call with the operation's exact C shape
    ///
    /// Handles, sizes and pointers share the address-sized integer class.
    unsafe fn call_direct(&self, ptr: *const c_void, args: &[NativeValue]) -> Result<NativeValue> {
        use core::mem::transmute;
        use AbiClass::{Byte, Float, Int, Void, Word};

        let ret = self.signature.ret;
        let mut classes = [Void; 4];
        if args.len() > classes.len() {
            return Err(InteropError::UnsupportedSignature { kind: self.kind });
        }
        for (slot, arg) in classes.iter_mut().zip(args) {
            *slot = AbiClass::of(arg.ty());
        }
        let shape = &classes[..args.len()];

        let value = match (shape, AbiClass::of(ret)) {
            ([Word], Word) => {
                let f: unsafe extern "C" fn(usize) -> usize = transmute(ptr);
                NativeValue::from_word(ret, f(args[0].word()))
            }
            ([Word], Int) => {
                let f: unsafe extern "C" fn(usize) -> i32 = transmute(ptr);
                NativeValue::I32(f(args[0].word()))
            }
            ([Word, Int], Word) => {
                let f: unsafe extern "C" fn(usize, i32) -> usize = transmute(ptr);
                NativeValue::from_word(ret, f(args[0].word(), int(&args[1])))
            }
            ([Word, Word], Int) => {
                let f: unsafe extern "C" fn(usize, usize) -> i32 = transmute(ptr);
                NativeValue::I32(f(args[0].word(), args[1].word()))
            }
            ([Word, Word], Float) => {
                let f: unsafe extern "C" fn(usize, usize) -> f64 = transmute(ptr);
                NativeValue::F64(f(args[0].word(), args[1].word()))
            }
            ([Word, Word], Byte) => {
                let f: unsafe extern "C" fn(usize, usize) -> u8 = transmute(ptr);
                NativeValue::U8(f(args[0].word(), args[1].word()))
            }
            ([Word, Word], Word) => {
                let f: unsafe extern "C" fn(usize, usize) -> usize = transmute(ptr);
                NativeValue::from_word(ret, f(args[0].word(), args[1].word()))
            }
            ([Word, Word, Int], Void) => {
                let f: unsafe extern "C" fn(usize, usize, i32) = transmute(ptr);
                f(args[0].word(), args[1].word(), int(&args[2]));
                NativeValue::Void
            }
            ([Word, Word, Float], Void) => {
                let f: unsafe extern "C" fn(usize, usize, f64) = transmute(ptr);
                f(args[0].word(), args[1].word(), float(&args[2]));
                NativeValue::Void
            }
            ([Word, Word, Byte], Void) => {
                let f: unsafe extern "C" fn(usize, usize, u8) = transmute(ptr);
                f(args[0].word(), args[1].word(), byte(&args[2]));
                NativeValue::Void
            }
            ([Word, Word, Word], Void) => {
                let f: unsafe extern "C" fn(usize, usize, usize) = transmute(ptr);
                f(args[0].word(), args[1].word(), args[2].word());
                NativeValue::Void
            }
            ([Word, Word, Word, Word], Word) => {
                let f: unsafe extern "C" fn(usize, usize, usize, usize) -> usize = transmute(ptr);
                NativeValue::from_word(
                    ret,
                    f(args[0].word(), args[1].word(), args[2].word(), args[3].word()),
                )
            }
            ([Word, Int, Int, Int], Int) => {
                let f: unsafe extern "C" fn(usize, i32, i32, i32) -> i32 = transmute(ptr);
                NativeValue::I32(f(args[0].word(), int(&args[1]), int(&args[2]), int(&args[3])))
            }
            _ => return Err(InteropError::UnsupportedSignature { kind: self.kind }),
        };
        Ok(value)
    }
}

/// Register class of a C argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AbiClass {
    Void,
    Int,
    Byte,
    Float,
    Word,
}

impl AbiClass {
    #[inline]
    const fn of(ty: NativeType) -> Self {
        if ty.is_word() {
            Self::Word
        } else if ty.is_float() {
            Self::Float
        } else {
            match ty {
                NativeType::I32 => Self::Int,
                NativeType::U8 => Self::Byte,
                _ => Self::Void,
            }
        }
    }
}

// Arguments are type-checked before dispatch; the fallbacks are unreachable.
#[inline]
fn int(value: &NativeValue) -> i32 {
    value.as_i32().unwrap_or_default()
}

#[inline]
fn float(value: &NativeValue) -> f64 {
    value.as_f64().unwrap_or_default()
}

#[inline]
fn byte(value: &NativeValue) -> u8 {
    value.as_u8().unwrap_or_default()
}
