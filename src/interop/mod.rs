//! Interoperability - invoke native entry points under the right convention
//!
//! Architecture:
//! - `types.rs` - native value model (NativeType, NativeValue, RawValue, Signature)
//! - `abi.rs` - calling-convention tags
//! - `marshal.rs` - argument validation and trampoline boxing
//! - `call.rs` - convention dispatch (direct, trampoline, managed)
//! - `library.rs` - symbol resolution (dlopen/LoadLibrary)

mod abi;
mod call;
mod library;
mod marshal;
mod types;

pub use abi::{CallingConvention, ConventionSet};
pub use call::{EntryPoint, FunctionCall, ManagedFn, TrampolineFn};
pub use library::Library;
pub use marshal::{check_args, coerce, from_raw, marshal_args, to_raw};
pub use types::{NativeType, NativeValue, RawValue, Signature};

use std::sync::atomic::{AtomicUsize, Ordering};

/// Bridge counters
#[derive(Debug, Clone, Copy)]
pub(crate) enum Counter {
    Messages,
    CapabilityMismatches,
    BoundsViolations,
    NativeCalls,
    TrampolineFailures,
    Registrations,
    ClassesPublished,
}

const COUNTERS: usize = 7;

#[allow(clippy::declare_interior_mutable_const)]
const ZERO: AtomicUsize = AtomicUsize::new(0);
static STATS: [AtomicUsize; COUNTERS] = [ZERO; COUNTERS];

#[inline]
pub(crate) fn record(counter: Counter) {
    STATS[counter as usize].fetch_add(1, Ordering::Relaxed);
}

#[inline]
fn load(counter: Counter) -> usize {
    STATS[counter as usize].load(Ordering::Relaxed)
}

/// Snapshot of bridge statistics
pub fn stats() -> InteropStats {
    InteropStats {
        messages: load(Counter::Messages),
        capability_mismatches: load(Counter::CapabilityMismatches),
        bounds_violations: load(Counter::BoundsViolations),
        native_calls: load(Counter::NativeCalls),
        trampoline_failures: load(Counter::TrampolineFailures),
        registrations: load(Counter::Registrations),
        classes_published: load(Counter::ClassesPublished),
    }
}

/// Zero all counters
pub fn reset_stats() {
    for counter in &STATS {
        counter.store(0, Ordering::Relaxed);
    }
}

/// Interop statistics for monitoring
///
/// Counters are process-wide and only ever increase between resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteropStats {
    pub messages: usize,
    pub capability_mismatches: usize,
    pub bounds_violations: usize,
    pub native_calls: usize,
    pub trampoline_failures: usize,
    pub registrations: usize,
    pub classes_published: usize,
}
