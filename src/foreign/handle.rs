//! Native handle - opaque address that only unboxes

use super::{ForeignObject, Unboxable};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle {
    address: usize,
}

impl NativeHandle {
    pub const fn new(address: usize) -> Self {
        Self { address }
    }

    #[inline]
    pub const fn address(&self) -> usize {
        self.address
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:#x})", self.address)
    }
}

impl Unboxable for NativeHandle {
    #[inline]
    fn unbox(&self) -> usize {
        self.address
    }
}

impl ForeignObject for NativeHandle {
    fn type_name(&self) -> &'static str {
        "NativeHandle"
    }

    fn as_unboxable(&self) -> Option<&dyn Unboxable> {
        Some(self)
    }
}
