//! Alternate representations - containers backed by native implementations
//!
//! Architecture:
//! - `kinds.rs` - operation kinds, element types, per-kind signatures
//! - `table.rs` - method table (one descriptor per kind)
//! - `class.rs` - class builder, frozen classes, concurrent class registry
//! - `vector.rs` - consumer operations with default fallbacks

mod class;
mod kinds;
mod table;
mod vector;

pub use class::{AltClass, ClassBuilder, ClassRegistry};
pub use kinds::{ElementType, OperationKind, Sortedness};
pub use table::{MethodTable, OperationDescriptor};
pub use vector::AltVector;

use once_cell::sync::Lazy;

/// Process-wide registry used by the C ABI
static GLOBAL_REGISTRY: Lazy<ClassRegistry> =
    Lazy::new(|| ClassRegistry::from_config(&crate::config::global_config().registry));

/// Process-wide class registry
pub fn global_registry() -> &'static ClassRegistry {
    &GLOBAL_REGISTRY
}

#[cfg(test)]
mod tests;
