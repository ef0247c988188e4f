//! Dispatch benchmarks
//!
//! Measures invocation cost per calling convention.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use foreign_bridge::interop::RawValue;
use foreign_bridge::{
    AltVector, CallingConvention, ClassBuilder, ElementType, EntryPoint, NativeValue,
    OperationKind,
};
use std::ffi::c_void;
use std::sync::Arc;

extern "C" fn direct_length(x: usize) -> isize {
    x as isize
}

unsafe extern "C" fn trampoline_length(args: *const RawValue, _nargs: usize, ret: *mut RawValue) -> i32 {
    (*ret).word = (*args).word;
    0
}

fn vector(entry: EntryPoint, convention: CallingConvention) -> AltVector {
    let class = ClassBuilder::new("bench", "dispatch", ElementType::Integer)
        .method(OperationKind::Length, entry, convention)
        .unwrap()
        .finish();
    AltVector::new(Arc::new(class), 1024)
}

fn bench_conventions(c: &mut Criterion) {
    let mut group = c.benchmark_group("length");

    let direct = vector(
        unsafe { EntryPoint::native(direct_length as *const c_void) },
        CallingConvention::DirectPointer,
    );
    group.bench_function("direct_pointer", |b| b.iter(|| black_box(direct.length().unwrap())));

    let trampoline = vector(
        unsafe { EntryPoint::native(trampoline_length as *const c_void) },
        CallingConvention::ManagedTrampoline,
    );
    group.bench_function("managed_trampoline", |b| {
        b.iter(|| black_box(trampoline.length().unwrap()))
    });

    let managed = vector(
        EntryPoint::managed(|args| Ok(NativeValue::Size(args[0].as_handle().unwrap_or(0) as isize))),
        CallingConvention::Managed,
    );
    group.bench_function("managed", |b| b.iter(|| black_box(managed.length().unwrap())));

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let direct = vector(
        unsafe { EntryPoint::native(direct_length as *const c_void) },
        CallingConvention::DirectPointer,
    );
    let class = direct.class();
    c.bench_function("resolve", |b| {
        b.iter(|| {
            for kind in OperationKind::ALL {
                black_box(class.resolve(black_box(kind)));
            }
        })
    });
}

criterion_group!(benches, bench_conventions, bench_resolve);
criterion_main!(benches);
