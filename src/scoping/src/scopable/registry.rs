//! Process-wide catalog of scopables

use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use super::dimension::DimensionRef;
use crate::association::ScopedEntity;
use crate::error::{Result, ScopingError};

static GLOBAL_REGISTRY: OnceLock<Arc<ScopableRegistry>> = OnceLock::new();

/// Append-only registry of scopables, deduplicated by handle identity
///
/// Registration normally happens once during startup; lookups happen on
/// every scoping call. Both are safe from any thread.
#[derive(Default)]
pub struct ScopableRegistry {
    scopables: RwLock<Vec<DimensionRef>>,
}

impl ScopableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    ///
    /// Created empty on first access and never torn down. Engines built
    /// with [`ScopingEngine::new`](crate::ScopingEngine::new) get their own
    /// registry instead, which keeps tests isolated.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL_REGISTRY.get_or_init(|| Arc::new(Self::new())))
    }

    /// Register a scopable
    ///
    /// Returns `Ok(false)` when this very handle is already registered.
    /// A different handle under an existing name is rejected.
    pub fn register(&self, scopable: DimensionRef) -> Result<bool> {
        let mut scopables = self.scopables.write();

        if scopables.iter().any(|existing| same_handle(existing, &scopable)) {
            debug!(scopable = scopable.name(), "Scopable already registered");
            return Ok(false);
        }

        if scopables.iter().any(|existing| existing.name() == scopable.name()) {
            return Err(ScopingError::DuplicateDimensionName(scopable.name().to_string()));
        }

        info!(
            scopable = scopable.name(),
            scoping_type = scopable.scoping_type(),
            "Scopable registered"
        );
        scopables.push(scopable);
        Ok(true)
    }

    /// Names of all registered scopables, in registration order
    pub fn list_names(&self) -> Vec<String> {
        self.scopables
            .read()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Whether a scopable with this name is registered
    pub fn exists(&self, name: &str) -> bool {
        self.scopables.read().iter().any(|s| s.name() == name)
    }

    /// All registered scopable handles
    pub fn all(&self) -> Vec<DimensionRef> {
        self.scopables.read().clone()
    }

    /// Scopable registered under `name`
    pub fn get(&self, name: &str) -> Option<DimensionRef> {
        self.scopables
            .read()
            .iter()
            .find(|s| s.name() == name)
            .cloned()
    }

    /// Number of registered scopables
    pub fn len(&self) -> usize {
        self.scopables.read().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.scopables.read().is_empty()
    }

    /// Whether `T` opts into the scopable named `name`
    pub fn is_scopable_by<T: ScopedEntity>(&self, name: &str) -> bool {
        T::SCOPABLES.contains(&name)
    }

    /// Registered scopables `T` opts into
    pub fn applicable_for<T: ScopedEntity>(&self) -> Vec<DimensionRef> {
        self.scopables
            .read()
            .iter()
            .filter(|s| self.is_scopable_by::<T>(s.name()))
            .cloned()
            .collect()
    }

    /// Registered scopables `T` opts into, failing when there are none
    pub fn applicable_for_or_err<T: ScopedEntity>(&self) -> Result<Vec<DimensionRef>> {
        let applicable = self.applicable_for::<T>();
        if applicable.is_empty() {
            return Err(ScopingError::NoApplicableDimension {
                entity_type: T::TYPE_NAME.to_string(),
            });
        }
        Ok(applicable)
    }
}

/// Identity comparison on the data pointer only
fn same_handle(a: &DimensionRef, b: &DimensionRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
