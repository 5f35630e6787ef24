//! Evaluation metrics for the scoping engine

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Snapshot of engine counters
#[derive(Debug, Clone, Default)]
pub struct ScopingMetrics {
    /// Membership evaluations
    pub evaluations: u64,

    /// Evaluations answering "within scope"
    pub within_scope: u64,

    /// Evaluations answering "outside scope"
    pub outside_scope: u64,

    /// Calls answered by the reserved keyword without resolving
    pub reserved_keyword_hits: u64,

    /// Collections scoped
    pub collections_scoped: u64,

    /// Calls that failed
    pub error_count: u64,

    /// Average evaluation latency
    ///
    /// Latency fields are computed from the sample window when a snapshot
    /// is taken.
    pub avg_latency_ms: f64,

    /// Evaluation latency percentiles
    pub latency_p50_ms: f64,
    pub latency_p99_ms: f64,
}

impl ScopingMetrics {
    /// Share of evaluations answering "within scope"
    pub fn within_rate(&self) -> f64 {
        let total = self.within_scope + self.outside_scope;
        if total == 0 {
            0.0
        } else {
            self.within_scope as f64 / total as f64
        }
    }
}

/// Collects [`ScopingMetrics`]
pub struct MetricsCollector {
    metrics: Arc<RwLock<ScopingMetrics>>,

    /// Recent latency samples, oldest first
    latency_samples: Arc<RwLock<VecDeque<f64>>>,

    max_samples: usize,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::with_max_samples(10_000)
    }

    pub fn with_max_samples(max_samples: usize) -> Self {
        Self {
            metrics: Arc::new(RwLock::new(ScopingMetrics::default())),
            latency_samples: Arc::new(RwLock::new(VecDeque::with_capacity(max_samples))),
            max_samples: max_samples.max(1),
        }
    }

    /// Record a membership decision
    pub async fn record_evaluation(&self, within: bool) {
        let mut metrics = self.metrics.write().await;
        metrics.evaluations += 1;
        if within {
            metrics.within_scope += 1;
        } else {
            metrics.outside_scope += 1;
        }
    }

    /// Record a reserved keyword short-circuit
    pub async fn record_reserved_keyword(&self) {
        self.metrics.write().await.reserved_keyword_hits += 1;
    }

    /// Record a scoped collection
    pub async fn record_collection_scoped(&self) {
        self.metrics.write().await.collections_scoped += 1;
    }

    /// Record a failed call
    pub async fn record_error(&self) {
        self.metrics.write().await.error_count += 1;
    }

    /// Record evaluation latency
    pub async fn record_latency(&self, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;

        let mut samples = self.latency_samples.write().await;
        if samples.len() == self.max_samples {
            samples.pop_front();
        }
        samples.push_back(latency_ms);
    }

    /// Current snapshot, latency percentiles included
    pub async fn snapshot(&self) -> ScopingMetrics {
        let mut metrics = self.metrics.read().await.clone();

        let mut sorted: Vec<f64> = self.latency_samples.read().await.iter().copied().collect();
        if !sorted.is_empty() {
            sorted.sort_by(f64::total_cmp);
            metrics.avg_latency_ms = sorted.iter().sum::<f64>() / sorted.len() as f64;
            metrics.latency_p50_ms = percentile(&sorted, 0.50);
            metrics.latency_p99_ms = percentile(&sorted, 0.99);
        }

        metrics
    }

    /// Reset all counters and samples
    pub async fn reset(&self) {
        *self.metrics.write().await = ScopingMetrics::default();
        self.latency_samples.write().await.clear();
    }

    /// Prometheus text exposition
    pub async fn export_prometheus(&self) -> String {
        let metrics = self.snapshot().await;

        format!(
            r#"# HELP scoping_evaluations_total Scope membership evaluations
# TYPE scoping_evaluations_total counter
scoping_evaluations_total {}

# HELP scoping_within_scope_total Evaluations within scope
# TYPE scoping_within_scope_total counter
scoping_within_scope_total {}

# HELP scoping_outside_scope_total Evaluations outside scope
# TYPE scoping_outside_scope_total counter
scoping_outside_scope_total {}

# HELP scoping_reserved_keyword_total Calls answered by a reserved keyword
# TYPE scoping_reserved_keyword_total counter
scoping_reserved_keyword_total {}

# HELP scoping_collections_scoped_total Collections scoped
# TYPE scoping_collections_scoped_total counter
scoping_collections_scoped_total {}

# HELP scoping_errors_total Failed calls
# TYPE scoping_errors_total counter
scoping_errors_total {}

# HELP scoping_latency_seconds Evaluation latency
# TYPE scoping_latency_seconds summary
scoping_latency_seconds{{quantile="0.5"}} {}
scoping_latency_seconds{{quantile="0.99"}} {}
"#,
            metrics.evaluations,
            metrics.within_scope,
            metrics.outside_scope,
            metrics.reserved_keyword_hits,
            metrics.collections_scoped,
            metrics.error_count,
            metrics.latency_p50_ms / 1000.0,
            metrics.latency_p99_ms / 1000.0,
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let idx = ((sorted.len() as f64) * p) as usize;
    sorted[idx.min(sorted.len() - 1)]
}
