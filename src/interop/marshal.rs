//! Value marshaling - tagged values <-> trampoline wire slots
//!
//! Arguments are validated against the operation signature before any
//! native call; a mismatch never reaches native code.

use super::types::{NativeType, NativeValue, RawValue, Signature};
use crate::error::{InteropError, Result};
use crate::logging::log_type_conversion;

/// Box a tagged value into a wire slot
#[inline]
pub fn to_raw(value: NativeValue) -> RawValue {
    let mut raw = RawValue::zeroed();
    match value {
        NativeValue::Void => {}
        NativeValue::I32(v) => raw.i32 = v,
        NativeValue::U8(v) => raw.u8 = v,
        NativeValue::F64(v) => raw.f64 = v,
        NativeValue::Size(_) | NativeValue::Handle(_) | NativeValue::Pointer(_) => {
            raw.word = value.word()
        }
    }
    raw
}

/// Unbox a wire slot as the given type
#[inline]
pub fn from_raw(raw: RawValue, ty: NativeType) -> NativeValue {
    // SAFETY: slots start zeroed through `bits`, and every bit pattern is a
    // valid i32 / u8 / f64 / usize.
    unsafe {
        match ty {
            NativeType::Void => NativeValue::Void,
            NativeType::I32 => NativeValue::I32(raw.i32),
            NativeType::U8 => NativeValue::U8(raw.u8),
            NativeType::F64 => NativeValue::F64(raw.f64),
            NativeType::Size | NativeType::Handle | NativeType::Pointer => {
                NativeValue::from_word(ty, raw.word)
            }
        }
    }
}

/// Box a whole argument list
pub fn marshal_args(args: &[NativeValue]) -> Vec<RawValue> {
    args.iter().map(|arg| to_raw(*arg)).collect()
}

/// Validate arity and argument types against a signature
pub fn check_args(signature: &Signature, args: &[NativeValue]) -> Result<()> {
    if args.len() != signature.arity() {
        return Err(InteropError::ArgCountMismatch {
            expected: signature.arity(),
            got: args.len(),
        });
    }

    for (position, (arg, expected)) in args.iter().zip(signature.args).enumerate() {
        let found = arg.ty();
        if found != *expected {
            return Err(InteropError::ArgTypeMismatch {
                position,
                expected: *expected,
                found,
            });
        }
    }
    Ok(())
}

/// Widen a value to the requested type where the conversion is lossless
///
/// Applied to values stored into alt vectors, so a `U8` can fill an
/// integer element.
pub fn coerce(value: NativeValue, target: NativeType) -> Option<NativeValue> {
    if value.ty() == target {
        return Some(value);
    }

    let converted = match (value, target) {
        (NativeValue::U8(v), NativeType::I32) => Some(NativeValue::I32(v as i32)),
        (NativeValue::I32(v), NativeType::F64) => Some(NativeValue::F64(v as f64)),
        (NativeValue::I32(v), NativeType::Size) => Some(NativeValue::Size(v as isize)),
        (NativeValue::Handle(v), NativeType::Pointer) => Some(NativeValue::Pointer(v)),
        (NativeValue::Pointer(v), NativeType::Handle) => Some(NativeValue::Handle(v)),
        _ => None,
    };

    if converted.is_some() {
        log_type_conversion(value.ty().name(), target.name());
    }
    converted
}
