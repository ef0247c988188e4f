//! Error taxonomy for the bridge
//!
//! All failures are local and synchronous. Nothing here is retried: a bounds
//! violation or a duplicate registration cannot succeed without changing the
//! input, so recovery belongs to the caller.

use crate::altrep::OperationKind;
use crate::foreign::Capability;
use crate::interop::{CallingConvention, NativeType};
use std::fmt;

pub type Result<T> = std::result::Result<T, InteropError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteropError {
    /// Index outside `[0, length)` on a buffer or vector
    OutOfBounds { index: i64, length: usize },
    /// Receiver does not implement the requested capability
    CapabilityMismatch { capability: Capability, receiver: &'static str },
    /// No descriptor bound for the operation kind
    UnresolvedOperation { kind: OperationKind },
    /// Operation kind already bound on this table
    DuplicateRegistration {
        kind: OperationKind,
        existing: CallingConvention,
        attempted: CallingConvention,
    },
    /// Entry point cannot be invoked under the declared convention
    ConventionMismatch { kind: OperationKind, tag: CallingConvention },
    /// Convention switched off by configuration
    ConventionDisabled { tag: CallingConvention },
    NullEntryPoint { kind: OperationKind },
    ArgCountMismatch { expected: usize, got: usize },
    ArgTypeMismatch { position: usize, expected: NativeType, found: NativeType },
    ReturnTypeMismatch { kind: OperationKind, expected: NativeType, found: NativeType },
    /// Native implementation returned a value outside its contract
    BadReturn { kind: OperationKind, value: i64 },
    UnsupportedSignature { kind: OperationKind },
    TrampolineFailed { kind: OperationKind, status: i32 },
    DuplicateClass { name: String },
    UnknownClass { name: String },
    /// Raw enumeration code from the C ABI did not decode
    InvalidCode { what: &'static str, code: u8 },
    InvalidName,
    /// Null object pointer passed over the C ABI
    NullPointer { what: &'static str },
    LibraryLoad(String),
    SymbolNotFound(String),
    Config(String),
}

impl InteropError {
    /// Stable error code for the C ABI (always negative)
    pub const fn code(&self) -> i32 {
        match self {
            Self::OutOfBounds { .. } => -1,
            Self::CapabilityMismatch { .. } => -2,
            Self::UnresolvedOperation { .. } => -3,
            Self::DuplicateRegistration { .. } => -4,
            Self::ConventionMismatch { .. } => -5,
            Self::ConventionDisabled { .. } => -6,
            Self::NullEntryPoint { .. } => -7,
            Self::ArgCountMismatch { .. } => -8,
            Self::ArgTypeMismatch { .. } => -9,
            Self::ReturnTypeMismatch { .. } => -10,
            Self::BadReturn { .. } => -11,
            Self::UnsupportedSignature { .. } => -12,
            Self::TrampolineFailed { .. } => -13,
            Self::DuplicateClass { .. } => -14,
            Self::UnknownClass { .. } => -15,
            Self::InvalidCode { .. } => -16,
            Self::InvalidName => -17,
            Self::LibraryLoad(_) => -18,
            Self::SymbolNotFound(_) => -19,
            Self::Config(_) => -20,
            Self::NullPointer { .. } => -21,
        }
    }
}

impl fmt::Display for InteropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { index, length } => {
                write!(f, "Index {} out of bounds for length {}", index, length)
            }
            Self::CapabilityMismatch { capability, receiver } => {
                write!(f, "{} does not support {}", receiver, capability)
            }
            Self::UnresolvedOperation { kind } => {
                write!(f, "No implementation registered for {}", kind)
            }
            Self::DuplicateRegistration { kind, existing, attempted } => write!(
                f,
                "{} already registered ({}), refusing {} registration",
                kind, existing, attempted
            ),
            Self::ConventionMismatch { kind, tag } => {
                write!(f, "Entry point for {} cannot be called as {}", kind, tag)
            }
            Self::ConventionDisabled { tag } => {
                write!(f, "Calling convention {} is disabled", tag)
            }
            Self::NullEntryPoint { kind } => write!(f, "Null entry point for {}", kind),
            Self::ArgCountMismatch { expected, got } => {
                write!(f, "Expected {} arguments, got {}", expected, got)
            }
            Self::ArgTypeMismatch { position, expected, found } => write!(
                f,
                "Argument {}: expected {}, found {}",
                position, expected, found
            ),
            Self::ReturnTypeMismatch { kind, expected, found } => write!(
                f,
                "{} returned {}, expected {}",
                kind, found, expected
            ),
            Self::BadReturn { kind, value } => {
                write!(f, "{} returned invalid value {}", kind, value)
            }
            Self::UnsupportedSignature { kind } => {
                write!(f, "No direct call shape for {}", kind)
            }
            Self::TrampolineFailed { kind, status } => {
                write!(f, "Trampoline for {} failed with status {}", kind, status)
            }
            Self::DuplicateClass { name } => write!(f, "Class {} already defined", name),
            Self::UnknownClass { name } => write!(f, "Unknown class {}", name),
            Self::InvalidCode { what, code } => write!(f, "Invalid {} code {}", what, code),
            Self::InvalidName => write!(f, "Invalid name"),
            Self::NullPointer { what } => write!(f, "Null {} pointer", what),
            Self::LibraryLoad(msg) => write!(f, "Failed to load library: {}", msg),
            Self::SymbolNotFound(name) => write!(f, "Symbol not found: {}", name),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for InteropError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_negative_and_distinct() {
        let errors = [
            InteropError::OutOfBounds { index: 4, length: 4 },
            InteropError::UnresolvedOperation { kind: OperationKind::Length },
            InteropError::InvalidName,
            InteropError::Config("bad".into()),
        ];
        let codes: Vec<i32> = errors.iter().map(InteropError::code).collect();
        assert!(codes.iter().all(|&c| c < 0));
        assert_eq!(codes, vec![-1, -3, -17, -20]);
    }

    #[test]
    fn test_display() {
        let err = InteropError::OutOfBounds { index: -1, length: 4 };
        assert_eq!(err.to_string(), "Index -1 out of bounds for length 4");

        let err = InteropError::DuplicateRegistration {
            kind: OperationKind::Length,
            existing: CallingConvention::DirectPointer,
            attempted: CallingConvention::ManagedTrampoline,
        };
        assert_eq!(
            err.to_string(),
            "Length already registered (direct-pointer), refusing managed-trampoline registration"
        );
    }
}
