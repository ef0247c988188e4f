//! Operation kinds, element types and their native signatures

use crate::interop::{NativeType, Signature};
use std::fmt;

use NativeType::{Handle as H, Pointer as P, Size as S, Void as V, F64, I32, U8};

/// Logical vector operation a class may implement natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationKind {
    Length = 0,
    Duplicate,
    /// Writable or read-only data pointer, forcing materialization
    Materialize,
    /// Data pointer only if already materialized
    MaterializeOrNull,
    ElementAt,
    SetElementAt,
    GetRegion,
    IsSorted,
    NoNa,
    Sum,
    Min,
    Max,
    Coerce,
    Inspect,
}

impl OperationKind {
    pub const COUNT: usize = 14;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Length,
        Self::Duplicate,
        Self::Materialize,
        Self::MaterializeOrNull,
        Self::ElementAt,
        Self::SetElementAt,
        Self::GetRegion,
        Self::IsSorted,
        Self::NoNa,
        Self::Sum,
        Self::Min,
        Self::Max,
        Self::Coerce,
        Self::Inspect,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decode a kind passed over the C ABI
    #[inline]
    pub const fn from_raw(code: u8) -> Option<Self> {
        if (code as usize) < Self::COUNT {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Length => "Length",
            Self::Duplicate => "Duplicate",
            Self::Materialize => "Materialize",
            Self::MaterializeOrNull => "MaterializeOrNull",
            Self::ElementAt => "ElementAt",
            Self::SetElementAt => "SetElementAt",
            Self::GetRegion => "GetRegion",
            Self::IsSorted => "IsSorted",
            Self::NoNa => "NoNa",
            Self::Sum => "Sum",
            Self::Min => "Min",
            Self::Max => "Max",
            Self::Coerce => "Coerce",
            Self::Inspect => "Inspect",
        }
    }

    /// Native signature for a class with the given element type
    ///
    /// Every signature takes the container handle first. Flags travel as C
    /// `int`.
    pub const fn signature(self, element: ElementType) -> Signature {
        match self {
            Self::Length => Signature::new(&[H], S),
            // (x, deep)
            Self::Duplicate => Signature::new(&[H, I32], H),
            // (x, writeable)
            Self::Materialize => Signature::new(&[H, I32], P),
            Self::MaterializeOrNull => Signature::new(&[H], P),
            Self::ElementAt => match element {
                ElementType::Integer | ElementType::Logical => Signature::new(&[H, S], I32),
                ElementType::Real => Signature::new(&[H, S], F64),
                ElementType::Raw => Signature::new(&[H, S], U8),
                ElementType::String => Signature::new(&[H, S], H),
            },
            Self::SetElementAt => match element {
                ElementType::Integer | ElementType::Logical => Signature::new(&[H, S, I32], V),
                ElementType::Real => Signature::new(&[H, S, F64], V),
                ElementType::Raw => Signature::new(&[H, S, U8], V),
                ElementType::String => Signature::new(&[H, S, H], V),
            },
            // (x, start, count, buf) -> copied
            Self::GetRegion => Signature::new(&[H, S, S, P], S),
            Self::IsSorted | Self::NoNa => Signature::new(&[H], I32),
            // (x, na_rm)
            Self::Sum | Self::Min | Self::Max => Signature::new(&[H, I32], H),
            // (x, target type code)
            Self::Coerce => Signature::new(&[H, I32], H),
            // (x, pre, deep, pvec) -> handled
            Self::Inspect => Signature::new(&[H, I32, I32, I32], I32),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element type of an alternate-representation vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    Integer = 0,
    Logical = 1,
    Real = 2,
    Raw = 3,
    String = 4,
}

impl ElementType {
    #[inline]
    pub const fn from_raw(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Integer),
            1 => Some(Self::Logical),
            2 => Some(Self::Real),
            3 => Some(Self::Raw),
            4 => Some(Self::String),
            _ => None,
        }
    }

    /// Native type of one element
    #[inline]
    pub const fn native_type(self) -> NativeType {
        match self {
            Self::Integer | Self::Logical => I32,
            Self::Real => F64,
            Self::Raw => U8,
            Self::String => H,
        }
    }

    /// Bytes per element in materialized storage
    #[inline]
    pub const fn width(self) -> usize {
        self.native_type().size()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Logical => "logical",
            Self::Real => "double",
            Self::Raw => "raw",
            Self::String => "character",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sortedness reported by `IsSorted`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sortedness {
    Unknown,
    Unsorted,
    Increasing,
    Decreasing,
    IncreasingNaFirst,
    DecreasingNaFirst,
}

impl Sortedness {
    pub const UNKNOWN_CODE: i32 = i32::MIN;

    /// Decode the native sortedness code; unrecognized codes are `Unknown`
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Unsorted,
            1 => Self::Increasing,
            -1 => Self::Decreasing,
            2 => Self::IncreasingNaFirst,
            -2 => Self::DecreasingNaFirst,
            _ => Self::Unknown,
        }
    }

    pub const fn code(self) -> i32 {
        match self {
            Self::Unknown => Self::UNKNOWN_CODE,
            Self::Unsorted => 0,
            Self::Increasing => 1,
            Self::Decreasing => -1,
            Self::IncreasingNaFirst => 2,
            Self::DecreasingNaFirst => -2,
        }
    }

    #[inline]
    pub const fn is_known_sorted(self) -> bool {
        !matches!(self, Self::Unknown | Self::Unsorted)
    }
}
