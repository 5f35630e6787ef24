//! Association inference with a process-lifetime binding cache
//!
//! For a (scoped type, scopable) pair the binding is the one relationship
//! field whose name is the singular or plural form of the scoping type.
//! Explicit overrides are consulted before inference runs.

use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, warn};

use super::entity::{RelationshipField, ScopedEntity};
use crate::error::{Result, ScopingError};
use crate::inflect::Inflector;
use crate::scopable::{binding_key, ScopingDimension};

/// Cache key: (entity type, scopable name)
type BindingKey = (TypeId, String);

/// Statistics about binding resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingStats {
    /// Bindings served from the cache
    pub hits: usize,
    /// Lookups that had to infer
    pub misses: usize,
    /// Times the relationship metadata was enumerated
    pub inferences: usize,
    /// Bindings answered by an explicit override
    pub overrides: usize,
    /// Cached bindings
    pub entries: usize,
}

impl BindingStats {
    /// Share of cached lookups
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Infer the association name linking an entity type to a scoping type
///
/// Intersects the declared relationship names with the singular and plural
/// form of `scoping_type`, keeping declaration order.
pub fn infer_association_name(
    entity_type: &str,
    relationships: &[RelationshipField],
    dimension: &dyn ScopingDimension,
    inflector: &dyn Inflector,
) -> Result<String> {
    let scoping_type = dimension.scoping_type();
    let singular = inflector.singular(scoping_type);
    let plural = inflector.plural(scoping_type);

    let mut candidates: Vec<String> = Vec::new();
    for field in relationships {
        let matches_name = field.name == singular || field.name == plural;
        if matches_name && !candidates.iter().any(|c| c == field.name) {
            candidates.push(field.name.to_string());
        }
    }

    match candidates.len() {
        0 => {
            warn!(
                entity_type,
                dimension = dimension.name(),
                singular = %singular,
                plural = %plural,
                "No association found"
            );
            Err(ScopingError::NoAssociationFound {
                entity_type: entity_type.to_string(),
                dimension: dimension.name().to_string(),
                scoping_type: scoping_type.to_string(),
            })
        }
        1 => Ok(candidates.remove(0)),
        _ => {
            warn!(
                entity_type,
                dimension = dimension.name(),
                ?candidates,
                "Ambiguous association names"
            );
            Err(ScopingError::AmbiguousAssociationName {
                entity_type: entity_type.to_string(),
                dimension: dimension.name().to_string(),
                candidates,
                binding_key: binding_key(dimension),
            })
        }
    }
}

/// Resolves and caches association bindings
///
/// Concurrent first lookups of the same pair may both infer; the computed
/// value is deterministic so the last write wins.
pub struct AssociationBindings {
    /// Inferred bindings
    cache: DashMap<BindingKey, String>,
    /// Bindings set at runtime through `set_override`
    overrides: DashMap<BindingKey, String>,
    /// Singular/plural derivation
    inflector: Arc<dyn Inflector>,
    /// Whether inferred bindings are cached
    cache_enabled: bool,
    /// Statistics counters
    stats: DashMap<&'static str, usize>,
}

impl AssociationBindings {
    pub fn new(inflector: Arc<dyn Inflector>, cache_enabled: bool) -> Self {
        Self {
            cache: DashMap::new(),
            overrides: DashMap::new(),
            inflector,
            cache_enabled,
            stats: DashMap::new(),
        }
    }

    /// Fix the association name of `T` for a scopable, bypassing inference
    pub fn set_override<T: ScopedEntity>(&self, dimension: &str, association: &str) -> Result<()> {
        if !is_identifier(association) {
            return Err(ScopingError::InvalidInput(format!(
                "association name '{}' for {} on {} must be a non-empty identifier",
                association,
                dimension,
                T::TYPE_NAME
            )));
        }

        let key = (TypeId::of::<T>(), dimension.to_string());
        self.cache.remove(&key);
        self.overrides.insert(key, association.to_string());

        debug!(
            entity_type = T::TYPE_NAME,
            dimension,
            association,
            "Association name set explicitly"
        );
        Ok(())
    }

    /// Association name binding `T` to `dimension`
    pub fn resolve<T: ScopedEntity>(&self, dimension: &dyn ScopingDimension) -> Result<String> {
        let key = (TypeId::of::<T>(), dimension.name().to_string());

        if let Some(association) = self.overrides.get(&key) {
            self.increment_stat("overrides");
            return Ok(association.value().clone());
        }

        if let Some(association) = T::association_override(dimension.name()) {
            self.increment_stat("overrides");
            return Ok(association.to_string());
        }

        if self.cache_enabled {
            if let Some(association) = self.cache.get(&key) {
                self.increment_stat("hits");
                return Ok(association.value().clone());
            }
        }
        self.increment_stat("misses");

        self.increment_stat("inferences");
        let association = infer_association_name(
            T::TYPE_NAME,
            T::RELATIONSHIPS,
            dimension,
            self.inflector.as_ref(),
        )?;

        debug!(
            entity_type = T::TYPE_NAME,
            dimension = dimension.name(),
            association = %association,
            "Association inferred"
        );

        if self.cache_enabled {
            self.cache.insert(key, association.clone());
        }

        Ok(association)
    }

    /// Binding statistics
    pub fn stats(&self) -> BindingStats {
        BindingStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            inferences: self.get_stat("inferences"),
            overrides: self.get_stat("overrides"),
            entries: self.cache.len(),
        }
    }

    /// Forget inferred bindings (overrides stay)
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.stats.clear();
    }

    fn increment_stat(&self, key: &'static str) {
        *self.stats.entry(key).or_insert(0) += 1;
    }

    fn get_stat(&self, key: &'static str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
