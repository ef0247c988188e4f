//! Alt vector - consumer-side operations with default fallbacks
//!
//! Each operation resolves its kind on the class. Bound kinds are invoked
//! under their registered convention; unbound kinds take the default path
//! documented on the method.

use super::class::AltClass;
use super::kinds::{ElementType, OperationKind, Sortedness};
use crate::error::{InteropError, Result};
use crate::foreign::ForeignBuffer;
use crate::interop::{coerce, NativeValue};
use std::sync::Arc;

/// One alternate-representation instance
#[derive(Debug, Clone)]
pub struct AltVector {
    class: Arc<AltClass>,
    handle: usize,
}

impl AltVector {
    /// Bind a native instance handle to its class
    pub fn new(class: Arc<AltClass>, handle: usize) -> Self {
        Self { class, handle }
    }

    pub fn class(&self) -> &Arc<AltClass> {
        &self.class
    }

    pub fn handle(&self) -> usize {
        self.handle
    }

    pub fn element(&self) -> ElementType {
        self.class.element()
    }

    /// Invoke `kind` if bound, `None` for the default path
    fn call(&self, kind: OperationKind, rest: &[NativeValue]) -> Result<Option<NativeValue>> {
        if self.class.resolve(kind).is_none() {
            return Ok(None);
        }
        let mut args = Vec::with_capacity(rest.len() + 1);
        args.push(NativeValue::Handle(self.handle));
        args.extend_from_slice(rest);
        self.class.invoke(kind, &args).map(Some)
    }

    /// Element count; `Length` has no default
    pub fn length(&self) -> Result<usize> {
        let kind = OperationKind::Length;
        let value = self
            .call(kind, &[])?
            .ok_or(InteropError::UnresolvedOperation { kind })?;
        let n = value.as_size().unwrap_or(-1);
        usize::try_from(n).map_err(|_| InteropError::BadReturn {
            kind,
            value: n as i64,
        })
    }

    fn check_index(&self, index: i64) -> Result<usize> {
        let length = self.length()?;
        usize::try_from(index)
            .ok()
            .filter(|&i| i < length)
            .ok_or(InteropError::OutOfBounds { index, length })
    }

    /// Data pointer, forcing materialization; no default
    pub fn materialize(&self, writeable: bool) -> Result<usize> {
        let kind = OperationKind::Materialize;
        let value = self
            .call(kind, &[NativeValue::from_bool(writeable)])?
            .ok_or(InteropError::UnresolvedOperation { kind })?;
        match value.as_pointer() {
            Some(0) | None => Err(InteropError::BadReturn { kind, value: 0 }),
            Some(ptr) => Ok(ptr),
        }
    }

    /// Data pointer if already materialized; default `None`
    pub fn materialize_or_null(&self) -> Result<Option<usize>> {
        Ok(self
            .call(OperationKind::MaterializeOrNull, &[])?
            .and_then(|value| value.as_pointer())
            .filter(|&ptr| ptr != 0))
    }

    /// Storage view over the materialized data
    fn data(&self, writeable: bool) -> Result<ForeignBuffer> {
        let ptr = self.materialize(writeable)?;
        let length = self.length()?;
        let bytes = length
            .checked_mul(self.element().width())
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or(InteropError::BadReturn {
                kind: OperationKind::Length,
                value: length as i64,
            })?;
        // SAFETY: `Materialize` yields `length` elements of contiguous storage
        // that stay valid while the instance is alive.
        let view = unsafe { ForeignBuffer::from_raw_parts(ptr as *mut u8, bytes) };
        view.ok_or(InteropError::BadReturn {
            kind: OperationKind::Materialize,
            value: 0,
        })
    }

    /// Element at `index`; default reads the materialized data
    pub fn element_at(&self, index: i64) -> Result<NativeValue> {
        let i = self.check_index(index)?;
        if let Some(value) = self.call(OperationKind::ElementAt, &[NativeValue::Size(i as isize)])? {
            return Ok(value);
        }

        let data = self.data(false)?;
        let width = self.element().width();
        let mut bytes = [0u8; 8];
        for (k, byte) in bytes[..width].iter_mut().enumerate() {
            *byte = data.read((i * width + k) as i64)?;
        }
        Ok(decode_element(self.element(), &bytes[..width]))
    }

    /// Store `value` at `index`; default writes the materialized data
    ///
    /// `value` is widened to the element type when that is lossless.
    pub fn set_element_at(&self, index: i64, value: NativeValue) -> Result<()> {
        let expected = self.element().native_type();
        let value = coerce(value, expected).ok_or(InteropError::ArgTypeMismatch {
            position: 2,
            expected,
            found: value.ty(),
        })?;

        let i = self.check_index(index)?;
        if self
            .call(OperationKind::SetElementAt, &[NativeValue::Size(i as isize), value])?
            .is_some()
        {
            return Ok(());
        }

        let data = self.data(true)?;
        let width = self.element().width();
        for (k, byte) in encode_element(value).iter().take(width).enumerate() {
            data.write((i * width + k) as i64, *byte)?;
        }
        Ok(())
    }

    /// Copy up to `count` elements starting at `start` into `buf`
    ///
    /// Copies `min(count, length - start)` elements and returns that number.
    /// `buf` must hold `count` elements. The default copies element-wise.
    pub fn get_region(&self, start: i64, count: usize, buf: &ForeignBuffer) -> Result<usize> {
        let width = self.element().width();
        let needed = count.saturating_mul(width);
        if needed > buf.len() {
            return Err(InteropError::OutOfBounds {
                index: needed as i64 - 1,
                length: buf.len(),
            });
        }

        let length = self.length()?;
        let first = usize::try_from(start)
            .ok()
            .filter(|&s| s <= length)
            .ok_or(InteropError::OutOfBounds { index: start, length })?;
        let n = count.min(length - first);

        let args = [
            NativeValue::Size(first as isize),
            NativeValue::Size(n as isize),
            NativeValue::Pointer(buf.unbox()),
        ];
        if let Some(value) = self.call(OperationKind::GetRegion, &args)? {
            let copied = value.as_size().unwrap_or(-1);
            return usize::try_from(copied)
                .ok()
                .filter(|&c| c <= n)
                .ok_or(InteropError::BadReturn {
                    kind: OperationKind::GetRegion,
                    value: copied as i64,
                });
        }

        for k in 0..n {
            let element = self.element_at((first + k) as i64)?;
            for (b, byte) in encode_element(element).iter().take(width).enumerate() {
                buf.write((k * width + b) as i64, *byte)?;
            }
        }
        Ok(n)
    }

    /// Default `Unknown`
    pub fn is_sorted(&self) -> Result<Sortedness> {
        Ok(self
            .call(OperationKind::IsSorted, &[])?
            .and_then(|value| value.as_i32())
            .map_or(Sortedness::Unknown, Sortedness::from_code))
    }

    /// Whether the vector is known to hold no NA; default `false`
    pub fn no_na(&self) -> Result<bool> {
        Ok(self
            .call(OperationKind::NoNa, &[])?
            .and_then(|value| value.as_i32())
            .is_some_and(|flag| flag != 0))
    }

    /// Duplicate handle; `None` means the caller duplicates generically
    pub fn duplicate(&self, deep: bool) -> Result<Option<usize>> {
        self.handle_result(OperationKind::Duplicate, &[NativeValue::from_bool(deep)])
    }

    pub fn sum(&self, na_rm: bool) -> Result<Option<usize>> {
        self.handle_result(OperationKind::Sum, &[NativeValue::from_bool(na_rm)])
    }

    pub fn min(&self, na_rm: bool) -> Result<Option<usize>> {
        self.handle_result(OperationKind::Min, &[NativeValue::from_bool(na_rm)])
    }

    pub fn max(&self, na_rm: bool) -> Result<Option<usize>> {
        self.handle_result(OperationKind::Max, &[NativeValue::from_bool(na_rm)])
    }

    /// Coerce to another element type; `None` means generic coercion
    pub fn coerce(&self, target: ElementType) -> Result<Option<usize>> {
        self.handle_result(OperationKind::Coerce, &[NativeValue::I32(target as i32)])
    }

    /// Class-specific inspection; `false` means the caller prints generically
    pub fn inspect(&self, pre: i32, deep: i32, pvec: i32) -> Result<bool> {
        let args = [NativeValue::I32(pre), NativeValue::I32(deep), NativeValue::I32(pvec)];
        Ok(self
            .call(OperationKind::Inspect, &args)?
            .and_then(|value| value.as_i32())
            .is_some_and(|handled| handled != 0))
    }

    /// Handle-returning kinds: unbound or null handle both mean "default"
    fn handle_result(&self, kind: OperationKind, rest: &[NativeValue]) -> Result<Option<usize>> {
        Ok(self
            .call(kind, rest)?
            .and_then(|value| value.as_handle())
            .filter(|&handle| handle != 0))
    }
}

fn decode_element(element: ElementType, bytes: &[u8]) -> NativeValue {
    let mut word = [0u8; 8];
    word[..bytes.len()].copy_from_slice(bytes);
    match element {
        ElementType::Integer | ElementType::Logical => {
            NativeValue::I32(i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
        ElementType::Real => NativeValue::F64(f64::from_ne_bytes(word)),
        ElementType::Raw => NativeValue::U8(bytes[0]),
        ElementType::String => {
            const WIDTH: usize = core::mem::size_of::<usize>();
            let mut handle = [0u8; WIDTH];
            handle.copy_from_slice(&bytes[..WIDTH]);
            NativeValue::Handle(usize::from_ne_bytes(handle))
        }
    }
}

fn encode_element(value: NativeValue) -> [u8; 8] {
    let mut out = [0u8; 8];
    match value {
        NativeValue::I32(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
        NativeValue::F64(v) => out.copy_from_slice(&v.to_ne_bytes()),
        NativeValue::U8(v) => out[0] = v,
        NativeValue::Handle(v) | NativeValue::Pointer(v) => {
            out[..core::mem::size_of::<usize>()].copy_from_slice(&v.to_ne_bytes())
        }
        NativeValue::Size(v) => out[..core::mem::size_of::<isize>()].copy_from_slice(&v.to_ne_bytes()),
        NativeValue::Void => {}
    }
    out
}
