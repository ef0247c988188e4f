//! Foreign buffer - byte-indexable view of a native memory region
//!
//! The adapter never owns the region. It holds the base address and the
//! length needed for bounds checks; the real owner lives outside the bridge
//! and must keep the region alive while any view exists. Copies of a view
//! alias the same memory, and writes are visible through all of them.
//!
//! No internal synchronization: concurrent access observes ordinary
//! shared-memory semantics, and callers needing atomicity lock externally.

use super::{check_index, ForeignObject, HasSize, Readable, Unboxable, Writable};
use crate::error::Result;
use crate::logging::log_buffer_access;
use core::ptr::NonNull;
use std::fmt;

#[derive(Clone, Copy)]
pub struct ForeignBuffer {
    base: NonNull<u8>,
    length: usize,
    trace_access: bool,
}

// A view is an address plus a length; the external owner governs access.
unsafe impl Send for ForeignBuffer {}

impl ForeignBuffer {
    /// Wrap `length` bytes at `base`
    ///
    /// Returns `None` for a null base with a non-zero length. A null, empty
    /// region is accepted and unboxes to a dangling, non-null address.
    ///
    /// # Safety
    /// - `base..base + length` must be valid for reads and writes for as long
    ///   as this view or any copy of it is used
    /// - the region must not be freed or shrunk while views exist
    #[inline]
    pub unsafe fn from_raw_parts(base: *mut u8, length: usize) -> Option<Self> {
        let base = match NonNull::new(base) {
            Some(base) => base,
            None if length == 0 => NonNull::dangling(),
            None => return None,
        };
        Some(Self {
            base,
            length,
            trace_access: false,
        })
    }

    /// # Safety
    /// Same contract as [`ForeignBuffer::from_raw_parts`].
    #[inline]
    pub(crate) unsafe fn from_non_null(base: NonNull<u8>, length: usize) -> Self {
        Self {
            base,
            length,
            trace_access: false,
        }
    }

    /// Emit a trace event per read/write
    pub fn with_access_tracing(mut self, enabled: bool) -> Self {
        self.trace_access = enabled;
        self
    }

    /// Length in bytes, fixed at construction
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    /// Byte at `index`
    #[inline]
    pub fn read(&self, index: i64) -> Result<u8> {
        let i = check_index(index, self.length)?;
        // SAFETY: `i < length` and the region is live per the constructor contract.
        let value = unsafe { self.base.as_ptr().add(i).read() };
        if self.trace_access {
            log_buffer_access("read", i, value);
        }
        Ok(value)
    }

    /// Store `value` at `index`, returning it
    #[inline]
    pub fn write(&self, index: i64, value: u8) -> Result<u8> {
        let i = check_index(index, self.length)?;
        // SAFETY: `i < length` and the region is live per the constructor contract.
        unsafe { self.base.as_ptr().add(i).write(value) };
        if self.trace_access {
            log_buffer_access("write", i, value);
        }
        Ok(value)
    }

    /// Base address
    #[inline]
    pub fn unbox(&self) -> usize {
        self.base.as_ptr() as usize
    }

    /// Copy the region out
    pub fn to_vec(&self) -> Vec<u8> {
        // SAFETY: the whole region is readable per the constructor contract.
        unsafe { std::slice::from_raw_parts(self.base.as_ptr(), self.length).to_vec() }
    }
}

impl fmt::Debug for ForeignBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignBuffer")
            .field("base", &self.base)
            .field("length", &self.length)
            .finish()
    }
}

impl HasSize for ForeignBuffer {
    #[inline]
    fn size(&self) -> usize {
        self.length
    }
}

impl Readable for ForeignBuffer {
    #[inline]
    fn read(&self, index: i64) -> Result<u8> {
        ForeignBuffer::read(self, index)
    }
}

impl Writable for ForeignBuffer {
    #[inline]
    fn write(&self, index: i64, value: u8) -> Result<u8> {
        ForeignBuffer::write(self, index, value)
    }
}

impl Unboxable for ForeignBuffer {
    #[inline]
    fn unbox(&self) -> usize {
        ForeignBuffer::unbox(self)
    }
}

impl ForeignObject for ForeignBuffer {
    fn type_name(&self) -> &'static str {
        "ForeignBuffer"
    }

    fn as_sized(&self) -> Option<&dyn HasSize> {
        Some(self)
    }

    fn as_readable(&self) -> Option<&dyn Readable> {
        Some(self)
    }

    fn as_writable(&self) -> Option<&dyn Writable> {
        Some(self)
    }

    fn as_unboxable(&self) -> Option<&dyn Unboxable> {
        Some(self)
    }
}
