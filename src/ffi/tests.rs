use super::*;
use crate::altrep::{global_registry, OperationKind};
use crate::interop::{CallingConvention, NativeValue};
use core::ffi::c_void;
use std::ffi::CString;

extern "C" fn fixed_length(_x: usize) -> isize {
    42
}

fn names(name: &str) -> (CString, CString) {
    (CString::new(name).unwrap(), CString::new("ffi_tests").unwrap())
}

#[test]
fn test_class_lifecycle() {
    let (name, package) = names("lifecycle");
    unsafe {
        let builder = fbridge_class_new(name.as_ptr(), package.as_ptr(), 0);
        assert!(!builder.is_null());

        let status = fbridge_class_set_method(
            builder,
            OperationKind::Length as u8,
            fixed_length as *const c_void,
            CallingConvention::DirectPointer as u8,
        );
        assert_eq!(status, FBRIDGE_OK);
        assert_eq!(fbridge_class_publish(builder), FBRIDGE_OK);
    }

    let class = global_registry().lookup("ffi_tests", "lifecycle").unwrap();
    let result = class
        .invoke(OperationKind::Length, &[NativeValue::Handle(1)])
        .unwrap();
    assert_eq!(result, NativeValue::Size(42));
}

#[test]
fn test_duplicate_method_sets_last_error() {
    let (name, package) = names("duplicate_method");
    unsafe {
        let builder = fbridge_class_new(name.as_ptr(), package.as_ptr(), 0);
        let entry = fixed_length as *const c_void;
        let length = OperationKind::Length as u8;

        assert_eq!(fbridge_class_set_method(builder, length, entry, 0), FBRIDGE_OK);
        let status = fbridge_class_set_method(builder, length, entry, 1);
        assert_eq!(status, -4);
        assert_eq!(fbridge_last_error(), -4);

        fbridge_class_discard(builder);
    }
    fbridge_clear_error();
    assert_eq!(fbridge_last_error(), FBRIDGE_OK);
    assert!(!global_registry().contains("ffi_tests", "duplicate_method"));
}

#[test]
fn test_set_method_rejects_bad_input() {
    let (name, package) = names("bad_input");
    unsafe {
        let builder = fbridge_class_new(name.as_ptr(), package.as_ptr(), 2);
        let entry = fixed_length as *const c_void;

        // Unknown kind, unknown convention
        assert_eq!(fbridge_class_set_method(builder, 200, entry, 0), -16);
        assert_eq!(fbridge_class_set_method(builder, 0, entry, 9), -16);
        // Managed tag with a native address
        assert_eq!(fbridge_class_set_method(builder, 0, entry, 2), -5);
        // Null entry point
        assert_eq!(fbridge_class_set_method(builder, 0, core::ptr::null(), 0), -7);
        // Null builder
        assert_eq!(
            fbridge_class_set_method(core::ptr::null_mut(), 0, entry, 0),
            -21
        );

        fbridge_class_discard(builder);
    }
}

#[test]
fn test_class_new_failures() {
    let (name, package) = names("bad_element");
    unsafe {
        assert!(fbridge_class_new(name.as_ptr(), package.as_ptr(), 9).is_null());
        assert_eq!(fbridge_last_error(), -16);

        assert!(fbridge_class_new(core::ptr::null(), package.as_ptr(), 0).is_null());
        assert_eq!(fbridge_last_error(), -17);
    }
}

#[test]
fn test_publish_twice_fails() {
    let (name, package) = names("published_twice");
    unsafe {
        let first = fbridge_class_new(name.as_ptr(), package.as_ptr(), 0);
        assert_eq!(fbridge_class_publish(first), FBRIDGE_OK);

        let second = fbridge_class_new(name.as_ptr(), package.as_ptr(), 0);
        assert_eq!(fbridge_class_publish(second), -14);

        assert_eq!(fbridge_class_publish(core::ptr::null_mut()), -21);
    }
}

#[test]
fn test_buffer_access() {
    let mut bytes = [0u8; 4];
    let base = bytes.as_mut_ptr();
    let mut out = 0u8;

    unsafe {
        assert_eq!(fbridge_buffer_write(base, 4, 0, 65), FBRIDGE_OK);
        assert_eq!(fbridge_buffer_write(base, 4, 3, 66), FBRIDGE_OK);
        assert_eq!(fbridge_buffer_read(base, 4, 3, &mut out), FBRIDGE_OK);
        assert_eq!(out, 66);

        out = 7;
        assert_eq!(fbridge_buffer_read(base, 4, 4, &mut out), -1);
        assert_eq!(out, 7);
        assert_eq!(fbridge_buffer_write(base, 4, -1, 1), -1);

        assert_eq!(fbridge_buffer_read(core::ptr::null_mut(), 4, 0, &mut out), -21);
        assert_eq!(fbridge_buffer_read(base, 4, 0, core::ptr::null_mut()), -21);
    }
    assert_eq!(bytes, [65, 0, 0, 66]);
}
