//! Alternate-representation classes
//!
//! A class is built single-threaded through `ClassBuilder`, then frozen and
//! published. Once published its method table is never mutated, so resolve
//! and invoke need no locking.

use super::kinds::{ElementType, OperationKind};
use super::table::{MethodTable, OperationDescriptor};
use crate::config::RegistrySection;
use crate::error::{InteropError, Result};
use crate::interop::{
    record, CallingConvention, ConventionSet, Counter, EntryPoint, Library, NativeValue,
};
use crate::logging::log_class_published;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// Frozen class: identity, element type, method table
#[derive(Debug)]
pub struct AltClass {
    name: String,
    package: String,
    element: ElementType,
    methods: MethodTable,
}

impl AltClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    #[inline]
    pub fn resolve(&self, kind: OperationKind) -> Option<&OperationDescriptor> {
        self.methods.resolve(kind)
    }

    /// Invoke a bound operation
    ///
    /// Unbound kinds fail with `UnresolvedOperation`; callers wanting a
    /// default path check `resolve` first.
    pub fn invoke(&self, kind: OperationKind, args: &[NativeValue]) -> Result<NativeValue> {
        let descriptor = self
            .resolve(kind)
            .ok_or(InteropError::UnresolvedOperation { kind })?;

        descriptor.invoke(kind.signature(self.element), args)
    }
}

impl fmt::Display for AltClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} <{}>", self.package, self.name, self.element)
    }
}

/// Mutable class under construction
#[derive(Debug)]
pub struct ClassBuilder {
    class: AltClass,
    enabled: ConventionSet,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>, package: impl Into<String>, element: ElementType) -> Self {
        Self {
            class: AltClass {
                name: name.into(),
                package: package.into(),
                element,
                methods: MethodTable::new(),
            },
            enabled: ConventionSet::all(),
        }
    }

    /// Restrict the conventions this builder accepts
    pub fn with_enabled(mut self, enabled: ConventionSet) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.class.name
    }

    pub fn register(
        &mut self,
        kind: OperationKind,
        entry: EntryPoint,
        convention: CallingConvention,
    ) -> Result<&OperationDescriptor> {
        if !self.enabled.contains(convention) {
            return Err(InteropError::ConventionDisabled { tag: convention });
        }
        self.class.methods.register(kind, entry, convention)
    }

    /// Chainable `register`
    ///
    /// An error consumes the builder, including the bindings made so far.
    /// Use `register` to keep the builder when a kind is already bound.
    pub fn method(
        mut self,
        kind: OperationKind,
        entry: EntryPoint,
        convention: CallingConvention,
    ) -> Result<Self> {
        self.register(kind, entry, convention)?;
        Ok(self)
    }

    /// Chainable registration of a Rust closure
    pub fn managed<F>(self, kind: OperationKind, f: F) -> Result<Self>
    where
        F: Fn(&[NativeValue]) -> Result<NativeValue> + Send + Sync + 'static,
    {
        self.method(kind, EntryPoint::managed(f), CallingConvention::Managed)
    }

    /// Register a symbol exported by `library`
    ///
    /// # Safety
    /// The symbol must satisfy the [`EntryPoint::native`] contract for
    /// `kind` and `convention`, and `library` must outlive the class.
    pub unsafe fn register_symbol(
        &mut self,
        kind: OperationKind,
        library: &Library,
        symbol: &str,
        convention: CallingConvention,
    ) -> Result<&OperationDescriptor> {
        let ptr = library.symbol(symbol)?;
        self.register(kind, EntryPoint::native(ptr), convention)
    }

    /// Freeze into an unpublished class
    pub fn finish(self) -> AltClass {
        self.class
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClassKey {
    package: String,
    name: String,
}

/// Published classes keyed by (package, name)
#[derive(Debug)]
pub struct ClassRegistry {
    classes: DashMap<ClassKey, Arc<AltClass>>,
    enabled: ConventionSet,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            classes: DashMap::new(),
            enabled: ConventionSet::all(),
        }
    }

    pub fn from_config(config: &RegistrySection) -> Self {
        Self {
            classes: DashMap::new(),
            enabled: config.enabled(),
        }
    }

    pub fn enabled(&self) -> ConventionSet {
        self.enabled
    }

    /// Start a class honoring this registry's enabled conventions
    pub fn builder(
        &self,
        name: impl Into<String>,
        package: impl Into<String>,
        element: ElementType,
    ) -> ClassBuilder {
        ClassBuilder::new(name, package, element).with_enabled(self.enabled)
    }

    /// Freeze and publish; a (package, name) pair is defined at most once
    ///
    /// Every bound convention must be enabled in this registry, whichever
    /// set the builder was created with.
    pub fn publish(&self, builder: ClassBuilder) -> Result<Arc<AltClass>> {
        let class = builder.finish();
        if let Some(descriptor) = class
            .methods
            .iter()
            .find(|descriptor| !self.enabled.contains(descriptor.convention()))
        {
            return Err(InteropError::ConventionDisabled {
                tag: descriptor.convention(),
            });
        }
        let key = ClassKey {
            package: class.package.clone(),
            name: class.name.clone(),
        };

        match self.classes.entry(key) {
            Entry::Occupied(_) => Err(InteropError::DuplicateClass {
                name: format!("{}::{}", class.package, class.name),
            }),
            Entry::Vacant(slot) => {
                log_class_published(&class.package, &class.name, class.methods.len());
                record(Counter::ClassesPublished);
                let class = Arc::new(class);
                slot.insert(Arc::clone(&class));
                Ok(class)
            }
        }
    }

    pub fn get(&self, package: &str, name: &str) -> Option<Arc<AltClass>> {
        let key = ClassKey {
            package: package.to_string(),
            name: name.to_string(),
        };
        self.classes.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// Like `get`, failing with `UnknownClass`
    pub fn lookup(&self, package: &str, name: &str) -> Result<Arc<AltClass>> {
        self.get(package, name).ok_or_else(|| InteropError::UnknownClass {
            name: format!("{}::{}", package, name),
        })
    }

    pub fn contains(&self, package: &str, name: &str) -> bool {
        self.get(package, name).is_some()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}
