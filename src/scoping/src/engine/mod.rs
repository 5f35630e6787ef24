//! Scope membership evaluation and collection scoping
//!
//! ```text
//! caller → ScopingEngine ─┬─ ScopableRegistry     (scopable by name)
//!                         ├─ AssociationBindings  (inferred field, cached)
//!                         └─ ScopingDimension     (keyword → ids | unbounded)
//!                                   ↓
//!                 bool (is_within_scope) | filtered collection (apply_scope)
//! ```

pub mod filter;
pub mod metrics;

pub use filter::{JoinKind, ScopeFilter, ScopedCollection};
pub use metrics::{MetricsCollector, ScopingMetrics};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::association::{associated_ids, AssociationBindings, BindingStats, ScopedEntity};
use crate::config::ScopingConfig;
use crate::error::{Result, ScopingError};
use crate::inflect::{EnglishInflector, Inflector};
use crate::scopable::{
    valid_keyword as keyword_available, DimensionRef, ScopableRegistry, ScopingDimension,
};
use crate::types::{IdSet, Keyword, Requester, ResolvedScope};

/// Answers "is this instance within the scope this keyword grants?"
///
/// Every call runs on the caller's task. The only state shared between
/// calls is the registry and the association binding cache, both safe for
/// concurrent use, so one engine is shared behind an `Arc`.
pub struct ScopingEngine {
    /// Scopables by name
    registry: Arc<ScopableRegistry>,

    /// Association bindings per (type, scopable)
    bindings: AssociationBindings,

    /// Evaluation metrics
    metrics: Option<Arc<MetricsCollector>>,

    /// Engine configuration
    config: ScopingConfig,
}

impl ScopingEngine {
    /// Engine with default configuration and its own empty registry
    pub fn new() -> Self {
        Self::with_config(ScopingConfig::default())
    }

    /// Engine with its own empty registry
    pub fn with_config(config: ScopingConfig) -> Self {
        Self::with_registry(config, Arc::new(ScopableRegistry::new()))
    }

    /// Engine backed by the process-wide registry
    pub fn with_global_registry(config: ScopingConfig) -> Self {
        Self::with_registry(config, ScopableRegistry::global())
    }

    /// Engine over an existing registry
    pub fn with_registry(config: ScopingConfig, registry: Arc<ScopableRegistry>) -> Self {
        Self::with_parts(config, registry, Arc::new(EnglishInflector::new()))
    }

    /// Engine over an existing registry and a custom inflector
    pub fn with_parts(
        config: ScopingConfig,
        registry: Arc<ScopableRegistry>,
        inflector: Arc<dyn Inflector>,
    ) -> Self {
        let metrics = config
            .enable_metrics
            .then(|| Arc::new(MetricsCollector::new()));

        debug!(
            binding_cache = config.enable_binding_cache,
            validate_keywords = config.validate_keywords,
            metrics = config.enable_metrics,
            "ScopingEngine initialized"
        );

        Self {
            registry,
            bindings: AssociationBindings::new(inflector, config.enable_binding_cache),
            metrics,
            config,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &ScopingConfig {
        &self.config
    }

    /// Registry backing this engine
    pub fn registry(&self) -> &Arc<ScopableRegistry> {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Register a scopable; registering the same handle twice is a no-op
    pub fn register(&self, scopable: DimensionRef) -> Result<bool> {
        self.registry.register(scopable)
    }

    /// Names of the registered scopables
    pub fn list_dimension_names(&self) -> Vec<String> {
        self.registry.list_names()
    }

    /// Whether a scopable is registered under `name`
    pub fn dimension_exists(&self, name: &str) -> bool {
        self.registry.exists(name)
    }

    /// Registered scopables `T` opts into; fails when there are none
    pub fn applicable_dimensions<T: ScopedEntity>(&self) -> Result<Vec<DimensionRef>> {
        self.registry.applicable_for_or_err::<T>()
    }

    // ------------------------------------------------------------------
    // Association bindings
    // ------------------------------------------------------------------

    /// Set the association `T` uses for `dimension`, bypassing inference
    pub fn set_association_name<T: ScopedEntity>(
        &self,
        dimension: &str,
        association: &str,
    ) -> Result<()> {
        self.bindings.set_override::<T>(dimension, association)
    }

    /// Association `T` uses for `dimension`
    pub fn association_name<T: ScopedEntity>(&self, dimension: &str) -> Result<String> {
        let scopable = self.scopable_for::<T>(dimension)?;
        self.bindings.resolve::<T>(scopable.as_ref())
    }

    /// Association binding statistics
    pub fn binding_stats(&self) -> BindingStats {
        self.bindings.stats()
    }

    /// Identifiers of the scoping instances `instance` is associated with
    pub fn associated_scope_ids<T: ScopedEntity>(
        &self,
        instance: &T,
        dimension: &str,
    ) -> Result<IdSet> {
        let scopable = self.scopable_for::<T>(dimension)?;
        self.instance_scope_ids(instance, scopable.as_ref())
    }

    // ------------------------------------------------------------------
    // Keywords
    // ------------------------------------------------------------------

    /// Keywords `requester` may use with `dimension`
    pub async fn available_keywords(
        &self,
        dimension: &str,
        requester: &Requester,
    ) -> Result<Vec<String>> {
        let scopable = self.scopable(dimension)?;
        scopable.available_keywords(requester).await
    }

    /// Whether `keyword` may be used with `dimension`
    pub async fn valid_keyword(
        &self,
        dimension: &str,
        keyword: &str,
        requester: &Requester,
    ) -> Result<bool> {
        let scopable = self.scopable(dimension)?;
        keyword_available(scopable.as_ref(), keyword, requester).await
    }

    /// Resolve `keyword` for `dimension`; reserved keywords are unbounded
    pub async fn resolve_keyword(
        &self,
        dimension: &str,
        keyword: &str,
        requester: &Requester,
    ) -> Result<ResolvedScope> {
        let scopable = self.scopable(dimension)?;
        self.resolve(scopable.as_ref(), &Keyword::parse(keyword), requester)
            .await
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Whether `instance` is within the scope `keyword` grants `requester`
    /// along `dimension`
    ///
    /// `Ok(false)` is an ordinary denial. Errors are misconfigurations or
    /// resolver failures and must not be treated as a denial.
    pub async fn is_within_scope<T: ScopedEntity>(
        &self,
        instance: &T,
        keyword: &str,
        dimension: &str,
        requester: &Requester,
    ) -> Result<bool> {
        let start = Instant::now();
        let result = self.evaluate(instance, keyword, dimension, requester).await;

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(within) => metrics.record_evaluation(*within).await,
                Err(_) => metrics.record_error().await,
            }
            metrics.record_latency(start.elapsed()).await;
        }

        result
    }

    async fn evaluate<T: ScopedEntity>(
        &self,
        instance: &T,
        keyword: &str,
        dimension: &str,
        requester: &Requester,
    ) -> Result<bool> {
        let scopable = self.scopable(dimension)?;

        let keyword = Keyword::parse(keyword);
        if keyword.is_reserved() {
            debug!(entity_type = T::TYPE_NAME, dimension, "Reserved keyword, within scope");
            self.record_reserved_keyword().await;
            return Ok(true);
        }
        self.ensure_applicable::<T>(dimension)?;

        let instance_ids = self.instance_scope_ids(instance, scopable.as_ref())?;
        let resolved = self.resolve(scopable.as_ref(), &keyword, requester).await?;
        let within = resolved.intersects(&instance_ids);

        debug!(
            entity_type = T::TYPE_NAME,
            dimension,
            keyword = %keyword,
            resolved = %resolved,
            instance_ids = instance_ids.len(),
            within,
            "Scope membership evaluated"
        );

        Ok(within)
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    /// Filter plan restricting a collection of `T` to the scope `keyword`
    /// grants `requester`
    pub async fn scope_filter<T: ScopedEntity>(
        &self,
        keyword: &str,
        dimension: &str,
        requester: &Requester,
    ) -> Result<ScopeFilter> {
        let scopable = self.scopable(dimension)?;

        let keyword = Keyword::parse(keyword);
        if keyword.is_reserved() {
            self.record_reserved_keyword().await;
            return Ok(ScopeFilter::Unrestricted);
        }
        self.ensure_applicable::<T>(dimension)?;

        let resolved = self.resolve(scopable.as_ref(), &keyword, requester).await?;

        let filter = if T::TYPE_NAME == scopable.scoping_type() {
            match resolved {
                ResolvedScope::Unbounded => ScopeFilter::Unrestricted,
                ResolvedScope::Ids(ids) => ScopeFilter::Ids(ids),
            }
        } else {
            let association = self.bindings.resolve::<T>(scopable.as_ref())?;
            match resolved {
                ResolvedScope::Unbounded => ScopeFilter::unbounded_association(
                    scopable.name(),
                    association,
                    scopable.scoping_type(),
                ),
                ResolvedScope::Ids(ids) => ScopeFilter::bounded_association(
                    scopable.name(),
                    association,
                    scopable.scoping_type(),
                    ids,
                ),
            }
        };

        debug!(
            entity_type = T::TYPE_NAME,
            dimension,
            keyword = %keyword,
            filter = %filter,
            "Scope filter built"
        );

        Ok(filter)
    }

    /// Restrict `collection` to the scope `keyword` grants `requester`
    pub async fn apply_scope<C: ScopedCollection>(
        &self,
        collection: C,
        keyword: &str,
        dimension: &str,
        requester: &Requester,
    ) -> Result<C> {
        let result = match self
            .scope_filter::<C::Entity>(keyword, dimension, requester)
            .await
        {
            Ok(filter) => collection.apply_filter(&filter),
            Err(err) => Err(err),
        };

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(_) => metrics.record_collection_scoped().await,
                Err(_) => metrics.record_error().await,
            }
        }

        result
    }

    /// Metrics snapshot, if metrics are enabled
    pub async fn metrics(&self) -> Option<ScopingMetrics> {
        match &self.metrics {
            Some(metrics) => Some(metrics.snapshot().await),
            None => None,
        }
    }

    /// Metrics collector, if metrics are enabled
    pub fn metrics_collector(&self) -> Option<&Arc<MetricsCollector>> {
        self.metrics.as_ref()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn scopable(&self, dimension: &str) -> Result<DimensionRef> {
        self.registry
            .get(dimension)
            .ok_or_else(|| ScopingError::UnknownDimension(dimension.to_string()))
    }

    /// Registered scopable that `T` opts into
    fn scopable_for<T: ScopedEntity>(&self, dimension: &str) -> Result<DimensionRef> {
        let scopable = self.scopable(dimension)?;
        self.ensure_applicable::<T>(dimension)?;
        Ok(scopable)
    }

    fn ensure_applicable<T: ScopedEntity>(&self, dimension: &str) -> Result<()> {
        if self.registry.is_scopable_by::<T>(dimension) {
            return Ok(());
        }

        self.registry.applicable_for_or_err::<T>()?;
        Err(ScopingError::DimensionNotApplicable {
            entity_type: T::TYPE_NAME.to_string(),
            dimension: dimension.to_string(),
        })
    }

    fn instance_scope_ids<T: ScopedEntity>(
        &self,
        instance: &T,
        scopable: &dyn ScopingDimension,
    ) -> Result<IdSet> {
        if T::TYPE_NAME == scopable.scoping_type() {
            return Ok(instance.scope_id().into_iter().collect());
        }

        let association = self.bindings.resolve::<T>(scopable)?;
        associated_ids(instance, &association, scopable.name(), scopable.scoping_type())
    }

    async fn resolve(
        &self,
        scopable: &dyn ScopingDimension,
        keyword: &Keyword,
        requester: &Requester,
    ) -> Result<ResolvedScope> {
        let name = match keyword {
            Keyword::All => return Ok(ResolvedScope::Unbounded),
            Keyword::Named(name) => name.as_str(),
        };

        if self.config.validate_keywords
            && !keyword_available(scopable, name, requester).await?
        {
            warn!(dimension = scopable.name(), keyword = name, "Keyword not available");
            return Err(ScopingError::UnknownKeyword {
                dimension: scopable.name().to_string(),
                keyword: name.to_string(),
            });
        }

        scopable.resolve_keyword(name, requester).await
    }

    async fn record_reserved_keyword(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_reserved_keyword().await;
        }
    }
}

impl Default for ScopingEngine {
    fn default() -> Self {
        Self::new()
    }
}
