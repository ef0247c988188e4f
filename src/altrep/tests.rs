use super::*;
use crate::config::RegistrySection;
use crate::error::InteropError;
use crate::foreign::ForeignBuffer;
use crate::interop::{CallingConvention, EntryPoint, NativeValue, RawValue};
use core::ffi::c_void;
use std::sync::Arc;

extern "C" fn native_length(_x: usize) -> isize {
    5
}

extern "C" fn native_real_at(_x: usize, index: isize) -> f64 {
    index as f64 * 2.0
}

extern "C" fn native_increasing(_x: usize) -> i32 {
    1
}

unsafe extern "C" fn trampoline_sum(_args: *const RawValue, nargs: usize, ret: *mut RawValue) -> i32 {
    if nargs != 2 {
        return 1;
    }
    (*ret).word = 77;
    0
}

fn native(f: *const c_void) -> EntryPoint {
    unsafe { EntryPoint::native(f) }
}

fn length_entry() -> EntryPoint {
    native(native_length as *const c_void)
}

#[test]
fn test_register_then_resolve() {
    let mut table = MethodTable::new();
    table
        .register(OperationKind::Length, length_entry(), CallingConvention::DirectPointer)
        .unwrap();

    let descriptor = table.resolve(OperationKind::Length).unwrap();
    assert_eq!(descriptor.kind(), OperationKind::Length);
    assert_eq!(descriptor.convention(), CallingConvention::DirectPointer);
    assert!(table.resolve(OperationKind::Duplicate).is_none());
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let mut table = MethodTable::new();
    table
        .register(OperationKind::Length, length_entry(), CallingConvention::DirectPointer)
        .unwrap();

    let err = table
        .register(
            OperationKind::Length,
            length_entry(),
            CallingConvention::ManagedTrampoline,
        )
        .unwrap_err();
    assert_eq!(
        err,
        InteropError::DuplicateRegistration {
            kind: OperationKind::Length,
            existing: CallingConvention::DirectPointer,
            attempted: CallingConvention::ManagedTrampoline,
        }
    );

    let descriptor = table.resolve(OperationKind::Length).unwrap();
    assert_eq!(descriptor.convention(), CallingConvention::DirectPointer);
    assert_eq!(table.len(), 1);
}

#[test]
fn test_kinds_do_not_interfere() {
    let mut table = MethodTable::new();
    table
        .register(OperationKind::Length, length_entry(), CallingConvention::DirectPointer)
        .unwrap();
    table
        .register(
            OperationKind::Sum,
            native(trampoline_sum as *const c_void),
            CallingConvention::ManagedTrampoline,
        )
        .unwrap();
    table
        .register(
            OperationKind::NoNa,
            EntryPoint::managed(|_| Ok(NativeValue::I32(1))),
            CallingConvention::Managed,
        )
        .unwrap();

    let tags: Vec<_> = table.iter().map(|d| (d.kind(), d.convention())).collect();
    // Slots are ordered by kind
    assert_eq!(
        tags,
        vec![
            (OperationKind::Length, CallingConvention::DirectPointer),
            (OperationKind::NoNa, CallingConvention::Managed),
            (OperationKind::Sum, CallingConvention::ManagedTrampoline),
        ]
    );
    for kind in OperationKind::ALL {
        let bound = matches!(kind, OperationKind::Length | OperationKind::Sum | OperationKind::NoNa);
        assert_eq!(table.is_bound(kind), bound, "{}", kind);
    }
}

#[test]
fn test_registration_rejections() {
    let mut table = MethodTable::new();

    assert_eq!(
        table
            .register(
                OperationKind::Min,
                native(core::ptr::null()),
                CallingConvention::DirectPointer
            )
            .unwrap_err(),
        InteropError::NullEntryPoint {
            kind: OperationKind::Min
        }
    );
    assert!(matches!(
        table.register(OperationKind::Min, length_entry(), CallingConvention::Managed),
        Err(InteropError::ConventionMismatch { .. })
    ));
    assert!(table.is_empty());
}

#[test]
fn test_convention_disabled_by_config() {
    let registry = ClassRegistry::from_config(&RegistrySection {
        enabled_conventions: vec![CallingConvention::DirectPointer],
    });
    let builder = registry.builder("disabled", "altrep_tests", ElementType::Integer);

    let err = builder
        .managed(OperationKind::Length, |_| Ok(NativeValue::Size(0)))
        .unwrap_err();
    assert_eq!(
        err,
        InteropError::ConventionDisabled {
            tag: CallingConvention::Managed
        }
    );
}

#[test]
fn test_registry_publish_and_lookup() {
    let registry = ClassRegistry::new();
    let builder = registry
        .builder("seq", "altrep_tests", ElementType::Real)
        .method(OperationKind::Length, length_entry(), CallingConvention::DirectPointer)
        .unwrap();
    let class = registry.publish(builder).unwrap();

    assert_eq!(class.to_string(), "altrep_tests::seq <double>");
    assert!(registry.contains("altrep_tests", "seq"));
    assert!(Arc::ptr_eq(&registry.lookup("altrep_tests", "seq").unwrap(), &class));
    assert_eq!(registry.len(), 1);

    let again = registry.builder("seq", "altrep_tests", ElementType::Integer);
    assert_eq!(
        registry.publish(again).unwrap_err(),
        InteropError::DuplicateClass {
            name: "altrep_tests::seq".to_string()
        }
    );
    assert!(matches!(
        registry.lookup("altrep_tests", "missing"),
        Err(InteropError::UnknownClass { .. })
    ));
    // Same name in another package is a different class
    assert!(registry
        .publish(registry.builder("seq", "other", ElementType::Real))
        .is_ok());
}

#[test]
fn test_invoke_unbound_kind() {
    let class = ClassBuilder::new("empty", "altrep_tests", ElementType::Raw).finish();
    assert_eq!(
        class.invoke(OperationKind::Length, &[NativeValue::Handle(1)]),
        Err(InteropError::UnresolvedOperation {
            kind: OperationKind::Length
        })
    );
}

/// Integer vector whose storage is a leaked slice, all methods managed
fn managed_integers(values: &[i32]) -> AltVector {
    let data: &'static mut [i32] = Box::leak(values.to_vec().into_boxed_slice());
    let address = data.as_mut_ptr() as usize;
    let length = data.len() as isize;

    let builder = ClassBuilder::new("ints", "altrep_tests", ElementType::Integer)
        .managed(OperationKind::Length, move |_| Ok(NativeValue::Size(length)))
        .unwrap()
        .managed(OperationKind::Materialize, move |_| Ok(NativeValue::Pointer(address)))
        .unwrap();
    AltVector::new(Arc::new(builder.finish()), 1)
}

#[test]
fn test_vector_default_element_access() {
    let vector = managed_integers(&[3, 1, 4, 1]);

    assert_eq!(vector.length().unwrap(), 4);
    assert_eq!(vector.element_at(2).unwrap(), NativeValue::I32(4));
    assert_eq!(
        vector.element_at(4),
        Err(InteropError::OutOfBounds { index: 4, length: 4 })
    );
    assert!(vector.element_at(-1).is_err());

    vector.set_element_at(1, NativeValue::I32(9)).unwrap();
    assert_eq!(vector.element_at(1).unwrap(), NativeValue::I32(9));

    assert!(matches!(
        vector.set_element_at(1, NativeValue::F64(1.0)),
        Err(InteropError::ArgTypeMismatch { position: 2, .. })
    ));
}

#[test]
fn test_vector_default_region() {
    let vector = managed_integers(&[10, 20, 30, 40]);
    let mut out = [0i32; 10];
    let buffer = unsafe {
        ForeignBuffer::from_raw_parts(out.as_mut_ptr() as *mut u8, core::mem::size_of_val(&out))
    }
    .unwrap();

    assert_eq!(vector.get_region(1, 10, &buffer).unwrap(), 3);
    assert_eq!(&out[..4], &[20, 30, 40, 0]);

    // Region past the end copies nothing
    assert_eq!(vector.get_region(4, 2, &buffer).unwrap(), 0);
    assert!(vector.get_region(5, 1, &buffer).is_err());
}

#[test]
fn test_vector_defaults() {
    let vector = managed_integers(&[1, 2]);

    assert_eq!(vector.is_sorted().unwrap(), Sortedness::Unknown);
    assert!(!vector.no_na().unwrap());
    assert_eq!(vector.sum(true).unwrap(), None);
    assert_eq!(vector.min(false).unwrap(), None);
    assert_eq!(vector.max(false).unwrap(), None);
    assert_eq!(vector.duplicate(true).unwrap(), None);
    assert_eq!(vector.coerce(ElementType::Real).unwrap(), None);
    assert_eq!(vector.materialize_or_null().unwrap(), None);
    assert!(!vector.inspect(0, 0, 0).unwrap());
    assert_ne!(vector.materialize(false).unwrap(), 0);
}

#[test]
fn test_vector_mandatory_operations() {
    let class = ClassBuilder::new("bare", "altrep_tests", ElementType::Integer).finish();
    let vector = AltVector::new(Arc::new(class), 1);

    assert_eq!(
        vector.length(),
        Err(InteropError::UnresolvedOperation {
            kind: OperationKind::Length
        })
    );
    assert!(matches!(
        vector.materialize(true),
        Err(InteropError::UnresolvedOperation {
            kind: OperationKind::Materialize
        })
    ));
}

#[test]
fn test_vector_native_methods() {
    let builder = ClassBuilder::new("native_seq", "altrep_tests", ElementType::Real)
        .method(OperationKind::Length, length_entry(), CallingConvention::DirectPointer)
        .unwrap()
        .method(
            OperationKind::ElementAt,
            native(native_real_at as *const c_void),
            CallingConvention::DirectPointer,
        )
        .unwrap()
        .method(
            OperationKind::IsSorted,
            native(native_increasing as *const c_void),
            CallingConvention::DirectPointer,
        )
        .unwrap()
        .method(
            OperationKind::Sum,
            native(trampoline_sum as *const c_void),
            CallingConvention::ManagedTrampoline,
        )
        .unwrap();
    let vector = AltVector::new(Arc::new(builder.finish()), 0x10);

    assert_eq!(vector.length().unwrap(), 5);
    assert_eq!(vector.element_at(3).unwrap(), NativeValue::F64(6.0));
    assert_eq!(vector.is_sorted().unwrap(), Sortedness::Increasing);
    assert_eq!(vector.sum(false).unwrap(), Some(77));

    // Element-wise region copy through the bound ElementAt
    let mut out = [0f64; 5];
    let buffer = unsafe {
        ForeignBuffer::from_raw_parts(out.as_mut_ptr() as *mut u8, core::mem::size_of_val(&out))
    }
    .unwrap();
    assert_eq!(vector.get_region(0, 5, &buffer).unwrap(), 5);
    assert_eq!(out, [0.0, 2.0, 4.0, 6.0, 8.0]);
}

#[test]
fn test_negative_length_is_bad_return() {
    let builder = ClassBuilder::new("negative", "altrep_tests", ElementType::Raw)
        .managed(OperationKind::Length, |_| Ok(NativeValue::Size(-2)))
        .unwrap();
    let vector = AltVector::new(Arc::new(builder.finish()), 1);

    assert_eq!(
        vector.length(),
        Err(InteropError::BadReturn {
            kind: OperationKind::Length,
            value: -2
        })
    );
}

#[test]
fn test_sortedness_codes() {
    for sortedness in [
        Sortedness::Unsorted,
        Sortedness::Increasing,
        Sortedness::Decreasing,
        Sortedness::IncreasingNaFirst,
        Sortedness::DecreasingNaFirst,
    ] {
        assert_eq!(Sortedness::from_code(sortedness.code()), sortedness);
    }
    assert_eq!(Sortedness::from_code(Sortedness::UNKNOWN_CODE), Sortedness::Unknown);
    assert!(!Sortedness::Unsorted.is_known_sorted());
}

#[test]
fn test_kind_codes() {
    for kind in OperationKind::ALL {
        assert_eq!(OperationKind::from_raw(kind as u8), Some(kind));
    }
    assert_eq!(OperationKind::from_raw(OperationKind::COUNT as u8), None);
    assert_eq!(ElementType::from_raw(4), Some(ElementType::String));
    assert_eq!(ElementType::Real.width(), 8);
}

#[test]
fn test_publish_rejects_disabled_convention() {
    let registry = ClassRegistry::from_config(&RegistrySection {
        enabled_conventions: vec![CallingConvention::DirectPointer],
    });
    let builder = ClassBuilder::new("unrestricted", "altrep_tests", ElementType::Integer)
        .method(OperationKind::Length, length_entry(), CallingConvention::DirectPointer)
        .unwrap()
        .managed(OperationKind::NoNa, |_| Ok(NativeValue::I32(1)))
        .unwrap();

    assert_eq!(
        registry.publish(builder).unwrap_err(),
        InteropError::ConventionDisabled {
            tag: CallingConvention::Managed
        }
    );
    assert!(!registry.contains("altrep_tests", "unrestricted"));
    assert!(registry.is_empty());
}

#[test]
fn test_huge_length_is_bad_return() {
    let mut storage = [0i32; 4];
    let address = storage.as_mut_ptr() as usize;
    let builder = ClassBuilder::new("huge", "altrep_tests", ElementType::Integer)
        .managed(OperationKind::Length, |_| Ok(NativeValue::Size(isize::MAX)))
        .unwrap()
        .managed(OperationKind::Materialize, move |_| Ok(NativeValue::Pointer(address)))
        .unwrap();
    let vector = AltVector::new(Arc::new(builder.finish()), 1);

    assert_eq!(
        vector.element_at(0),
        Err(InteropError::BadReturn {
            kind: OperationKind::Length,
            value: isize::MAX as i64
        })
    );
    assert_eq!(storage, [0; 4]);
}

#[test]
fn test_set_element_widens_value() {
    let vector = managed_integers(&[0, 0]);

    vector.set_element_at(1, NativeValue::U8(200)).unwrap();
    assert_eq!(vector.element_at(1).unwrap(), NativeValue::I32(200));
}

#[test]
fn test_concurrent_resolve_and_invoke() {
    let registry = ClassRegistry::new();
    let builder = registry
        .builder("shared", "altrep_tests", ElementType::Real)
        .method(OperationKind::Length, length_entry(), CallingConvention::DirectPointer)
        .unwrap()
        .method(
            OperationKind::Sum,
            native(trampoline_sum as *const c_void),
            CallingConvention::ManagedTrampoline,
        )
        .unwrap()
        .managed(OperationKind::NoNa, |_| Ok(NativeValue::I32(1)))
        .unwrap();
    let class = registry.publish(builder).unwrap();

    std::thread::scope(|scope| {
        for t in 0..8usize {
            let class = &class;
            let registry = &registry;
            scope.spawn(move || {
                for _ in 0..200 {
                    let found = registry.lookup("altrep_tests", "shared").unwrap();
                    assert!(Arc::ptr_eq(&found, class));
                    assert_eq!(
                        found.resolve(OperationKind::Sum).unwrap().convention(),
                        CallingConvention::ManagedTrampoline
                    );

                    let handle = NativeValue::Handle(t);
                    assert_eq!(
                        found.invoke(OperationKind::Length, &[handle]).unwrap(),
                        NativeValue::Size(5)
                    );
                    assert_eq!(
                        found
                            .invoke(OperationKind::Sum, &[handle, NativeValue::from_bool(true)])
                            .unwrap(),
                        NativeValue::Handle(77)
                    );
                    assert_eq!(
                        found.invoke(OperationKind::NoNa, &[handle]).unwrap(),
                        NativeValue::I32(1)
                    );
                }
            });
        }
    });
}
