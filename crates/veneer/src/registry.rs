//! Capability registry mapping backend interfaces to factories.
//!
//! The registry is populated once, when a toolkit engine is built, and is
//! read-only afterwards. Each capability is keyed by the `TypeId` of its
//! trait object (`dyn ButtonBackend`, ...), so lookups are checked against the
//! static capability type a widget declares rather than discovered at runtime.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::backend::Capability;

/// Typed factory stored behind `dyn Any`.
type Factory<B> = Box<dyn Fn() -> Arc<B> + Send + Sync>;

/// Type-erased factory storage.
struct FactoryEntry {
    factory: Box<dyn Any + Send + Sync>,
    capability: &'static str,
}

/// Maps capability interfaces to backend constructors.
///
/// # Example
///
/// ```ignore
/// let mut registry = BackendRegistry::new();
/// registry.register::<dyn ButtonBackend>(|| Arc::new(GtkButton::new()));
///
/// let button = registry.create::<dyn ButtonBackend>().unwrap();
/// ```
#[derive(Default)]
pub struct BackendRegistry {
    factories: AHashMap<TypeId, FactoryEntry>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            factories: AHashMap::new(),
        }
    }

    /// Register the factory for capability `B`, replacing any previous one.
    ///
    /// Returns `true` if a factory was replaced.
    pub fn register<B>(&mut self, factory: impl Fn() -> Arc<B> + Send + Sync + 'static) -> bool
    where
        B: ?Sized + Capability,
    {
        let factory: Factory<B> = Box::new(factory);
        let entry = FactoryEntry {
            factory: Box::new(factory),
            capability: B::NAME,
        };

        let replaced = self.factories.insert(TypeId::of::<B>(), entry).is_some();
        if replaced {
            tracing::debug!("Replaced backend factory for {}", B::NAME);
        }
        replaced
    }

    /// Check whether capability `B` has a factory.
    pub fn contains<B: ?Sized + Capability>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<B>())
    }

    /// Construct a new backend for capability `B`.
    ///
    /// Returns `None` when no factory is registered.
    pub fn create<B: ?Sized + Capability>(&self) -> Option<Arc<B>> {
        let entry = self.factories.get(&TypeId::of::<B>())?;
        let factory = entry.factory.downcast_ref::<Factory<B>>()?;
        Some(factory())
    }

    /// Remove the factory for capability `B`.
    pub fn unregister<B: ?Sized + Capability>(&mut self) -> bool {
        self.factories.remove(&TypeId::of::<B>()).is_some()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Names of all registered capabilities (for debugging).
    pub fn capability_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.values().map(|entry| entry.capability)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("count", &self.factories.len())
            .field("capabilities", &self.capability_names().collect::<Vec<_>>())
            .finish()
    }
}
