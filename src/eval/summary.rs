//! Per-pipeline aggregation of registry outcomes, used to compare plain RAG
//! against GraphRAG runs over the same cases.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::eval::metrics::MetricValue;
use crate::eval::registry::{MetricOutcome, COST_EFFICIENCY, NDCG, PRECISION_RECALL, RESPONSE_TIME, USER_SATISFACTION};

/// Aggregate scores for one pipeline.
///
/// Means only count cases where the metric was available; `None` means no case had it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub cases: usize,
    pub mean_precision: Option<f64>,
    pub mean_recall: Option<f64>,
    pub mean_f1: Option<f64>,
    pub mean_ndcg: Option<f64>,
    pub mean_satisfaction: Option<f64>,
    pub mean_response_time: Option<f64>,
    pub fast_ratio: Option<f64>,
    pub acceptable_ratio: Option<f64>,
    /// Sum over cases that reported a cost.
    pub total_cost: Option<f64>,
}

#[derive(Default)]
struct Accumulator {
    cases: usize,
    precision: Vec<f64>,
    recall: Vec<f64>,
    f1: Vec<f64>,
    ndcg: Vec<f64>,
    satisfaction: Vec<f64>,
    response_time: Vec<f64>,
    fast: Vec<f64>,
    acceptable: Vec<f64>,
    costs: Vec<f64>,
}

impl Accumulator {
    fn push(&mut self, outcomes: &BTreeMap<String, MetricOutcome>) {
        self.cases += 1;
        let value = |name: &str| outcomes.get(name).and_then(MetricOutcome::value);

        if let Some(pr) = value(PRECISION_RECALL).and_then(MetricValue::as_precision_recall) {
            self.precision.push(pr.precision);
            self.recall.push(pr.recall);
            self.f1.push(pr.f1);
        }
        if let Some(ndcg) = value(NDCG).and_then(MetricValue::as_scalar) {
            self.ndcg.push(ndcg);
        }
        if let Some(satisfaction) = value(USER_SATISFACTION).and_then(MetricValue::as_scalar) {
            self.satisfaction.push(satisfaction);
        }
        if let Some(rt) = value(RESPONSE_TIME).and_then(MetricValue::as_response_time) {
            self.response_time.push(rt.response_time);
            self.fast.push(if rt.is_fast { 1.0 } else { 0.0 });
            self.acceptable.push(if rt.is_acceptable { 1.0 } else { 0.0 });
        }
        if let Some(cost) = value(COST_EFFICIENCY)
            .and_then(MetricValue::as_cost)
            .and_then(|c| c.total_cost)
        {
            self.costs.push(cost);
        }
    }

    fn finish(self) -> PipelineSummary {
        PipelineSummary {
            cases: self.cases,
            mean_precision: mean(&self.precision),
            mean_recall: mean(&self.recall),
            mean_f1: mean(&self.f1),
            mean_ndcg: mean(&self.ndcg),
            mean_satisfaction: mean(&self.satisfaction),
            mean_response_time: mean(&self.response_time),
            fast_ratio: mean(&self.fast),
            acceptable_ratio: mean(&self.acceptable),
            total_cost: if self.costs.is_empty() {
                None
            } else {
                Some(self.costs.iter().sum())
            },
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Group `(pipeline, outcomes)` pairs by pipeline and aggregate each group.
pub fn summarize<'a, I>(evaluations: I) -> BTreeMap<String, PipelineSummary>
where
    I: IntoIterator<Item = (&'a str, &'a BTreeMap<String, MetricOutcome>)>,
{
    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
    for (pipeline, outcomes) in evaluations {
        groups.entry(pipeline.to_string()).or_default().push(outcomes);
    }
    groups.into_iter().map(|(pipeline, acc)| (pipeline, acc.finish())).collect()
}
