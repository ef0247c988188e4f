//! Native value model
//!
//! `NativeValue` is the safe, tagged form used by callers; `RawValue` is the
//! untagged C union that crosses a trampoline boundary.

use std::fmt;

/// C-level type of an argument or return slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NativeType {
    Void,
    I32,
    U8,
    F64,
    /// Signed element count / index (`ptrdiff_t`)
    Size,
    /// Opaque managed-object handle
    Handle,
    /// Raw data address
    Pointer,
}

impl NativeType {
    /// Size of type in bytes
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Void => 0,
            Self::U8 => 1,
            Self::I32 => 4,
            Self::F64 => 8,
            Self::Size | Self::Handle | Self::Pointer => core::mem::size_of::<usize>(),
        }
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64)
    }

    /// Passed in a general-purpose register as an address-sized integer
    #[inline]
    pub const fn is_word(self) -> bool {
        matches!(self, Self::Size | Self::Handle | Self::Pointer)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::I32 => "int32_t",
            Self::U8 => "uint8_t",
            Self::F64 => "double",
            Self::Size => "ptrdiff_t",
            Self::Handle => "handle",
            Self::Pointer => "void*",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tagged native value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    Void,
    I32(i32),
    U8(u8),
    F64(f64),
    Size(isize),
    Handle(usize),
    Pointer(usize),
}

impl NativeValue {
    /// C boolean (`int`, 0 or 1)
    #[inline]
    pub const fn from_bool(value: bool) -> Self {
        Self::I32(value as i32)
    }

    #[inline]
    pub const fn ty(&self) -> NativeType {
        match self {
            Self::Void => NativeType::Void,
            Self::I32(_) => NativeType::I32,
            Self::U8(_) => NativeType::U8,
            Self::F64(_) => NativeType::F64,
            Self::Size(_) => NativeType::Size,
            Self::Handle(_) => NativeType::Handle,
            Self::Pointer(_) => NativeType::Pointer,
        }
    }

    pub const fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::I32(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_u8(&self) -> Option<u8> {
        match *self {
            Self::U8(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F64(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_size(&self) -> Option<isize> {
        match *self {
            Self::Size(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_handle(&self) -> Option<usize> {
        match *self {
            Self::Handle(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_pointer(&self) -> Option<usize> {
        match *self {
            Self::Pointer(v) => Some(v),
            _ => None,
        }
    }

    /// Address-sized bit pattern of a word value, zero otherwise
    #[inline]
    pub(crate) const fn word(&self) -> usize {
        match *self {
            Self::Size(v) => v as usize,
            Self::Handle(v) | Self::Pointer(v) => v,
            _ => 0,
        }
    }

    /// Rebuild a word value of the given type from its bit pattern
    #[inline]
    pub(crate) const fn from_word(ty: NativeType, bits: usize) -> Self {
        match ty {
            NativeType::Size => Self::Size(bits as isize),
            NativeType::Pointer => Self::Pointer(bits),
            _ => Self::Handle(bits),
        }
    }
}

/// Trampoline wire value (untagged union)
///
/// Always created fully initialized through `bits`, so reading any field is
/// defined.
#[repr(C)]
#[derive(Clone, Copy)]
pub union RawValue {
    pub bits: u64,
    pub i32: i32,
    pub u8: u8,
    pub f64: f64,
    pub word: usize,
}

impl RawValue {
    #[inline]
    pub const fn zeroed() -> Self {
        Self { bits: 0 }
    }
}

impl Default for RawValue {
    #[inline]
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: every constructor initializes all 8 bytes.
        write!(f, "RawValue({:#018x})", unsafe { self.bits })
    }
}

/// Native signature of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub args: &'static [NativeType],
    pub ret: NativeType,
}

impl Signature {
    #[inline]
    pub const fn new(args: &'static [NativeType], ret: NativeType) -> Self {
        Self { args, ret }
    }

    #[inline]
    pub const fn arity(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ") -> {}", self.ret)
    }
}
