//! Named collection of metrics evaluated together against one result.

use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use crate::config::EvalConfig;
use crate::eval::metrics::{BuiltinMetric, Metric, MetricValue, DEFAULT_K};
use crate::eval::result::{GroundTruthItem, RecommendationResult};

/// Log target used when none is given.
pub const DEFAULT_LOG_TARGET: &str = "graphrag_eval::registry";

// Names of the built-in metrics in a default registry.
pub const PRECISION_RECALL: &str = "precision_recall";
pub const NDCG: &str = "ndcg";
pub const USER_SATISFACTION: &str = "user_satisfaction";
pub const RESPONSE_TIME: &str = "response_time";
pub const COST_EFFICIENCY: &str = "cost_efficiency";

/// Per-metric result of [`MetricRegistry::evaluate`].
///
/// `Unavailable` serializes as `null` so a failed metric can never be read as a zero score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricOutcome {
    Value(MetricValue),
    Unavailable,
}

impl MetricOutcome {
    pub fn value(&self) -> Option<&MetricValue> {
        match self {
            MetricOutcome::Value(v) => Some(v),
            MetricOutcome::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, MetricOutcome::Unavailable)
    }
}

/// Registry of metrics keyed by unique name.
///
/// Not internally synchronized; wrap it in a `Mutex` if several threads mutate it.
pub struct MetricRegistry {
    metrics: BTreeMap<String, Box<dyn Metric>>,
    log_target: String,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry {
    /// Registry with the five built-in metrics at the default cutoff.
    pub fn new() -> Self {
        Self::with_k(DEFAULT_K, DEFAULT_K)
    }

    /// Registry with the five built-in metrics at the given cutoffs.
    pub fn with_k(precision_k: usize, ndcg_k: usize) -> Self {
        let mut registry = Self::empty();
        registry.insert_builtin(PRECISION_RECALL, BuiltinMetric::PrecisionRecall { k: precision_k });
        registry.insert_builtin(NDCG, BuiltinMetric::Ndcg { k: ndcg_k });
        registry.insert_builtin(USER_SATISFACTION, BuiltinMetric::UserSatisfaction);
        registry.insert_builtin(RESPONSE_TIME, BuiltinMetric::ResponseTime);
        registry.insert_builtin(COST_EFFICIENCY, BuiltinMetric::CostEfficiency);
        registry
    }

    pub fn from_config(config: &EvalConfig) -> Self {
        Self::with_k(config.precision_k, config.ndcg_k)
    }

    /// Registry with no metrics.
    pub fn empty() -> Self {
        Self {
            metrics: BTreeMap::new(),
            log_target: DEFAULT_LOG_TARGET.to_string(),
        }
    }

    /// Route this registry's log records to `target`.
    pub fn with_log_target(mut self, target: impl Into<String>) -> Self {
        self.log_target = target.into();
        self
    }

    fn insert_builtin(&mut self, name: &str, metric: BuiltinMetric) {
        log::trace!(target: self.log_target.as_str(), "Registering {} as {}", metric.label(), name);
        self.metrics.insert(name.to_string(), Box::new(metric));
    }

    /// Run every metric against one result.
    ///
    /// A metric that returns an error or panics is logged and reported as
    /// [`MetricOutcome::Unavailable`]; the remaining metrics still run.
    pub fn evaluate(
        &self,
        result: &RecommendationResult,
        ground_truth: &[GroundTruthItem],
    ) -> BTreeMap<String, MetricOutcome> {
        self.metrics
            .iter()
            .map(|(name, metric)| {
                let computed = panic::catch_unwind(AssertUnwindSafe(|| metric.compute(result, ground_truth)));
                let outcome = match computed {
                    Ok(Ok(value)) => {
                        log::debug!(target: self.log_target.as_str(), "Metric {}: {:?}", name, value);
                        MetricOutcome::Value(value)
                    }
                    Ok(Err(e)) => {
                        log::error!(target: self.log_target.as_str(), "Error calculating metric {}: {}", name, e);
                        MetricOutcome::Unavailable
                    }
                    Err(payload) => {
                        log::error!(
                            target: self.log_target.as_str(),
                            "Metric {} panicked: {}",
                            name,
                            panic_message(payload.as_ref())
                        );
                        MetricOutcome::Unavailable
                    }
                };
                (name.clone(), outcome)
            })
            .collect()
    }

    /// One-sentence description of every registered metric.
    pub fn describe_all(&self) -> BTreeMap<String, String> {
        self.metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric.describe()))
            .collect()
    }

    /// Insert `metric` under `name`, replacing any metric already there.
    pub fn add(&mut self, name: impl Into<String>, metric: Box<dyn Metric>) {
        let name = name.into();
        log::info!(target: self.log_target.as_str(), "Added custom metric: {}", name);
        self.metrics.insert(name, metric);
    }

    /// Remove the metric registered as `name`. Unknown names are logged and ignored.
    pub fn remove(&mut self, name: &str) {
        if self.metrics.remove(name).is_some() {
            log::info!(target: self.log_target.as_str(), "Removed metric: {}", name);
        } else {
            log::warn!(target: self.log_target.as_str(), "Metric {} not found", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
