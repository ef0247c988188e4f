//! Method table - one descriptor per operation kind

use super::kinds::OperationKind;
use crate::error::{InteropError, Result};
use crate::interop::{
    record, CallingConvention, Counter, EntryPoint, FunctionCall, NativeValue, Signature,
};
use crate::logging::{log_duplicate_registration, log_registration};

/// One native-backed implementation of an operation
///
/// The tag is fixed at registration; nothing re-derives it from the entry.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    kind: OperationKind,
    entry: EntryPoint,
    convention: CallingConvention,
}

impl OperationDescriptor {
    #[inline]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    #[inline]
    pub fn entry(&self) -> &EntryPoint {
        &self.entry
    }

    #[inline]
    pub fn convention(&self) -> CallingConvention {
        self.convention
    }

    /// Call the entry point under the registered convention
    pub fn invoke(&self, signature: Signature, args: &[NativeValue]) -> Result<NativeValue> {
        FunctionCall::new(self.kind, &self.entry, self.convention, signature).call(args)
    }
}

/// Operation kind -> descriptor, at most one each
#[derive(Debug, Clone)]
pub struct MethodTable {
    slots: [Option<OperationDescriptor>; OperationKind::COUNT],
}

impl MethodTable {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Bind `kind` to `entry` invoked under `convention`
    ///
    /// Re-binding a kind is a configuration error; the first binding is kept.
    pub fn register(
        &mut self,
        kind: OperationKind,
        entry: EntryPoint,
        convention: CallingConvention,
    ) -> Result<&OperationDescriptor> {
        if entry.is_null() {
            return Err(InteropError::NullEntryPoint { kind });
        }
        if !entry.accepts(convention) {
            return Err(InteropError::ConventionMismatch {
                kind,
                tag: convention,
            });
        }

        let slot = &mut self.slots[kind.index()];
        if let Some(existing) = slot.as_ref() {
            log_duplicate_registration(kind.name(), existing.convention.name(), convention.name());
            return Err(InteropError::DuplicateRegistration {
                kind,
                existing: existing.convention,
                attempted: convention,
            });
        }

        log_registration(kind.name(), convention.name());
        record(Counter::Registrations);
        let descriptor: &OperationDescriptor = slot.insert(OperationDescriptor {
            kind,
            entry,
            convention,
        });
        Ok(descriptor)
    }

    /// Bound descriptor, `None` when the kind takes the default path
    #[inline]
    pub fn resolve(&self, kind: OperationKind) -> Option<&OperationDescriptor> {
        self.slots[kind.index()].as_ref()
    }

    #[inline]
    pub fn is_bound(&self, kind: OperationKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Number of bound kinds
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.slots.iter().flatten()
    }
}

impl Default for MethodTable {
    fn default() -> Self {
        Self::new()
    }
}
