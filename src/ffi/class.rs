//! Class lifecycle - C API for defining alternate-representation classes
//!
//! A builder is created, receives methods one at a time, then is either
//! published into the global registry or discarded. Both consume it.

use super::{c_str, fail, status, FBRIDGE_OK};
use crate::altrep::{global_registry, ClassBuilder, ElementType, OperationKind};
use crate::error::{InteropError, Result};
use crate::interop::{CallingConvention, EntryPoint};
use core::ffi::{c_char, c_void};
use core::ptr;

/// Start a class definition
///
/// Returns null on failure (see `fbridge_last_error`).
///
/// # Safety
/// - `name` and `package` must be NUL-terminated strings
/// - the returned builder must be passed to exactly one of
///   `fbridge_class_publish` / `fbridge_class_discard`
#[no_mangle]
pub unsafe extern "C" fn fbridge_class_new(
    name: *const c_char,
    package: *const c_char,
    element: u8,
) -> *mut ClassBuilder {
    let builder = (|| -> Result<ClassBuilder> {
        let name = c_str(name)?;
        let package = c_str(package)?;
        let element = ElementType::from_raw(element).ok_or(InteropError::InvalidCode {
            what: "element type",
            code: element,
        })?;
        Ok(global_registry().builder(name, package, element))
    })();

    match builder {
        Ok(builder) => Box::into_raw(Box::new(builder)),
        Err(err) => {
            fail("fbridge_class_new", &err);
            ptr::null_mut()
        }
    }
}

/// Bind `kind` to a native entry point under `convention`
///
/// Only native tags are accepted here; managed implementations are
/// registered from Rust.
///
/// # Safety
/// - `builder` must come from `fbridge_class_new` and not yet be consumed
/// - `entry` must satisfy the [`EntryPoint::native`] contract for `kind`
#[no_mangle]
pub unsafe extern "C" fn fbridge_class_set_method(
    builder: *mut ClassBuilder,
    kind: u8,
    entry: *const c_void,
    convention: u8,
) -> i32 {
    let result = (|| -> Result<()> {
        let builder = builder
            .as_mut()
            .ok_or(InteropError::NullPointer { what: "builder" })?;
        let kind = OperationKind::from_raw(kind).ok_or(InteropError::InvalidCode {
            what: "operation kind",
            code: kind,
        })?;
        let tag = CallingConvention::from_raw(convention).ok_or(InteropError::InvalidCode {
            what: "calling convention",
            code: convention,
        })?;
        builder.register(kind, EntryPoint::native(entry), tag)?;
        Ok(())
    })();

    status("fbridge_class_set_method", result)
}

/// Freeze and publish the class, consuming the builder
///
/// # Safety
/// `builder` must come from `fbridge_class_new` and not yet be consumed.
#[no_mangle]
pub unsafe extern "C" fn fbridge_class_publish(builder: *mut ClassBuilder) -> i32 {
    if builder.is_null() {
        return fail(
            "fbridge_class_publish",
            &InteropError::NullPointer { what: "builder" },
        );
    }

    let builder = Box::from_raw(builder);
    match global_registry().publish(*builder) {
        Ok(_) => FBRIDGE_OK,
        Err(err) => fail("fbridge_class_publish", &err),
    }
}

/// Drop an unpublished builder
///
/// # Safety
/// `builder` must be null or come from `fbridge_class_new` and not yet be
/// consumed.
#[no_mangle]
pub unsafe extern "C" fn fbridge_class_discard(builder: *mut ClassBuilder) {
    if !builder.is_null() {
        drop(Box::from_raw(builder));
    }
}
