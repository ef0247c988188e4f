//! Char array - managed bytes that move to native memory on first unbox
//!
//! Until unboxed, reads and writes hit the managed copy. The first `unbox`
//! copies the bytes into a stable native block, caches its address, and from
//! then on every access goes through that block. The array owns the block
//! and frees it on drop.

use super::{check_index, ForeignBuffer, ForeignObject, HasSize, Readable, Unboxable, Writable};
use crate::error::Result;
use crate::logging::log_materialize;
use core::ptr::NonNull;
use parking_lot::RwLock;
use std::fmt;

pub struct CharArray {
    storage: RwLock<Storage>,
    length: usize,
}

enum Storage {
    Managed(Vec<u8>),
    Native(NativeBlock),
}

/// Heap block with a stable address, exclusively owned
struct NativeBlock {
    ptr: NonNull<[u8]>,
}

// The block is uniquely owned by its `CharArray`; access goes through the lock.
unsafe impl Send for NativeBlock {}
unsafe impl Sync for NativeBlock {}

impl NativeBlock {
    fn copy_from(bytes: &[u8]) -> Self {
        let boxed: Box<[u8]> = bytes.into();
        Self {
            ptr: NonNull::from(Box::leak(boxed)),
        }
    }

    fn view(&self) -> ForeignBuffer {
        // SAFETY: the block lives until `self` drops and never changes size.
        unsafe { ForeignBuffer::from_non_null(self.ptr.cast::<u8>(), self.ptr.len()) }
    }
}

impl Drop for NativeBlock {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `Box::leak` and is released exactly once.
        unsafe { drop(Box::from_raw(self.ptr.as_ptr())) }
    }
}

impl CharArray {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            length: bytes.len(),
            storage: RwLock::new(Storage::Managed(bytes)),
        }
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether the bytes live in the native block
    pub fn is_native(&self) -> bool {
        matches!(*self.storage.read(), Storage::Native(_))
    }

    pub fn read(&self, index: i64) -> Result<u8> {
        let i = check_index(index, self.length)?;
        match &*self.storage.read() {
            Storage::Managed(bytes) => Ok(bytes[i]),
            Storage::Native(block) => block.view().read(index),
        }
    }

    pub fn write(&self, index: i64, value: u8) -> Result<u8> {
        let i = check_index(index, self.length)?;
        match &mut *self.storage.write() {
            Storage::Managed(bytes) => {
                bytes[i] = value;
                Ok(value)
            }
            Storage::Native(block) => block.view().write(index, value),
        }
    }

    /// Native address, migrating the bytes on first call
    pub fn unbox(&self) -> usize {
        if let Storage::Native(block) = &*self.storage.read() {
            return block.view().unbox();
        }

        let mut storage = self.storage.write();
        let block = match &*storage {
            // Another thread migrated between the two locks
            Storage::Native(block) => return block.view().unbox(),
            Storage::Managed(bytes) => NativeBlock::copy_from(bytes),
        };
        let address = block.view().unbox();
        log_materialize(self.length, address);
        *storage = Storage::Native(block);
        address
    }

    /// Current contents
    pub fn to_vec(&self) -> Vec<u8> {
        match &*self.storage.read() {
            Storage::Managed(bytes) => bytes.clone(),
            Storage::Native(block) => block.view().to_vec(),
        }
    }

    /// Contents as text, up to the first NUL
    pub fn to_string_lossy(&self) -> String {
        let bytes = self.to_vec();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }
}

impl From<&str> for CharArray {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for CharArray {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for CharArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharArray")
            .field("length", &self.length)
            .field("native", &self.is_native())
            .finish()
    }
}

impl HasSize for CharArray {
    #[inline]
    fn size(&self) -> usize {
        self.length
    }
}

impl Readable for CharArray {
    fn read(&self, index: i64) -> Result<u8> {
        CharArray::read(self, index)
    }
}

impl Writable for CharArray {
    fn write(&self, index: i64, value: u8) -> Result<u8> {
        CharArray::write(self, index, value)
    }
}

impl Unboxable for CharArray {
    fn unbox(&self) -> usize {
        CharArray::unbox(self)
    }
}

impl ForeignObject for CharArray {
    fn type_name(&self) -> &'static str {
        "CharArray"
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
