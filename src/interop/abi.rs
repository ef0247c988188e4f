//! Calling-convention families
//!
//! A tag is data supplied by whoever registers an entry point. The same raw
//! function-pointer bits are ambiguous across families, so the tag is never
//! inferred from the pointer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Native-extension ABI family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum CallingConvention {
    /// Plain `extern "C"` function with the operation's exact signature
    DirectPointer = 0,
    /// Native function reached through the boxed-argument trampoline
    /// `fn(args: *const RawValue, nargs: usize, ret: *mut RawValue) -> i32`
    ManagedTrampoline = 1,
    /// In-runtime Rust implementation
    Managed = 2,
}

impl CallingConvention {
    pub const ALL: [Self; 3] = [Self::DirectPointer, Self::ManagedTrampoline, Self::Managed];

    /// Decode a tag passed over the C ABI
    #[inline]
    pub const fn from_raw(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::DirectPointer),
            1 => Some(Self::ManagedTrampoline),
            2 => Some(Self::Managed),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::DirectPointer => "direct-pointer",
            Self::ManagedTrampoline => "managed-trampoline",
            Self::Managed => "managed",
        }
    }

    /// Entry point is a native code address
    #[inline]
    pub const fn is_native(self) -> bool {
        !matches!(self, Self::Managed)
    }

    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of enabled conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConventionSet(u8);

impl ConventionSet {
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn all() -> Self {
        Self(0b111)
    }

    #[inline]
    pub const fn contains(self, tag: CallingConvention) -> bool {
        self.0 & tag.bit() != 0
    }

    #[inline]
    pub fn insert(&mut self, tag: CallingConvention) {
        self.0 |= tag.bit();
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = CallingConvention> {
        CallingConvention::ALL
            .into_iter()
            .filter(move |tag| self.contains(*tag))
    }
}

impl Default for ConventionSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<CallingConvention> for ConventionSet {
    fn from_iter<I: IntoIterator<Item = CallingConvention>>(iter: I) -> Self {
        let mut set = Self::empty();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}
