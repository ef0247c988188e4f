//! Buffer access - bounds-checked byte access for native callers

use super::{fail, FBRIDGE_OK};
use crate::config::global_config;
use crate::error::{InteropError, Result};
use crate::foreign::ForeignBuffer;

/// # Safety
/// Same contract as [`ForeignBuffer::from_raw_parts`].
unsafe fn view(base: *mut u8, length: usize) -> Result<ForeignBuffer> {
    ForeignBuffer::from_raw_parts(base, length)
        .map(|buffer| buffer.with_access_tracing(global_config().buffer.trace_access))
        .ok_or(InteropError::NullPointer { what: "buffer" })
}

/// Read `base[index]` into `*out`
///
/// Returns 0, or a negative code with `*out` untouched.
///
/// # Safety
/// - `base..base + length` must be readable
/// - `out` must be null or valid for a one-byte write
#[no_mangle]
pub unsafe extern "C" fn fbridge_buffer_read(
    base: *mut u8,
    length: usize,
    index: i64,
    out: *mut u8,
) -> i32 {
    let result = view(base, length).and_then(|buffer| {
        let out = out.as_mut().ok_or(InteropError::NullPointer { what: "out" })?;
        *out = buffer.read(index)?;
        Ok(())
    });

    match result {
        Ok(()) => FBRIDGE_OK,
        Err(err) => fail("fbridge_buffer_read", &err),
    }
}

/// Store `value` at `base[index]`
///
/// # Safety
/// `base..base + length` must be writable.
#[no_mangle]
pub unsafe extern "C" fn fbridge_buffer_write(
    base: *mut u8,
    length: usize,
    index: i64,
    value: u8,
) -> i32 {
    match view(base, length).and_then(|buffer| buffer.write(index, value)) {
        Ok(_) => FBRIDGE_OK,
        Err(err) => fail("fbridge_buffer_write", &err),
    }
}
