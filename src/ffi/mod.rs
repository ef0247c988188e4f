//! C FFI - stable ABI for native extensions
//!
//! Design: thin C bindings over the Rust API with:
//! 1. Class lifecycle (new, set method, publish, discard)
//! 2. Bounds-checked access to native buffers
//! 3. Error propagation via negative status codes plus a thread-local
//!    last-error slot

mod buffer;
mod class;

pub use buffer::{fbridge_buffer_read, fbridge_buffer_write};
pub use class::{
    fbridge_class_discard, fbridge_class_new, fbridge_class_publish, fbridge_class_set_method,
};

use crate::error::{InteropError, Result};
use crate::logging::log_ffi_error;
use core::ffi::c_char;
use std::cell::Cell;
use std::ffi::CStr;

/// Status returned by every fallible entry point on success
pub const FBRIDGE_OK: i32 = 0;

thread_local! {
    static LAST_ERROR: Cell<i32> = const { Cell::new(FBRIDGE_OK) };
}

/// Code of the last failure on this thread, `0` if none
#[no_mangle]
pub extern "C" fn fbridge_last_error() -> i32 {
    LAST_ERROR.with(Cell::get)
}

/// Reset the last-error slot
#[no_mangle]
pub extern "C" fn fbridge_clear_error() {
    LAST_ERROR.with(|slot| slot.set(FBRIDGE_OK));
}

/// Record `err` as this thread's last error, returning its code
pub(crate) fn fail(function: &str, err: &InteropError) -> i32 {
    log_ffi_error(function, &err.to_string());
    let code = err.code();
    LAST_ERROR.with(|slot| slot.set(code));
    code
}

/// Collapse a result into a C status code
pub(crate) fn status(function: &str, result: Result<()>) -> i32 {
    match result {
        Ok(()) => FBRIDGE_OK,
        Err(err) => fail(function, &err),
    }
}

/// Borrow a NUL-terminated UTF-8 string
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn c_str<'a>(ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(InteropError::InvalidName);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| InteropError::InvalidName)
}

#[cfg(test)]
mod tests;
