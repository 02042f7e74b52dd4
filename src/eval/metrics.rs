//! Recommendation quality metrics: Precision/Recall@K, NDCG@K, user satisfaction,
//! response time and cost efficiency.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::error::Result;
use crate::eval::result::{ground_truth_ids, recommended_ids, GroundTruthItem, Recommendation, RecommendationResult};

/// Default cutoff for rank-based metrics.
pub const DEFAULT_K: usize = 10;

/// Responses faster than this (seconds) count as fast.
pub const FAST_RESPONSE_SECS: f64 = 0.2;

/// Responses faster than this (seconds) count as acceptable.
pub const ACCEPTABLE_RESPONSE_SECS: f64 = 1.0;

/// Something that scores a recommendation result against ground truth.
///
/// Implement this for custom metrics and register them with
/// [`MetricRegistry::add`](crate::eval::MetricRegistry::add).
pub trait Metric: Send + Sync {
    fn compute(&self, result: &RecommendationResult, ground_truth: &[GroundTruthItem]) -> Result<MetricValue>;

    /// One-sentence, human-readable description.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrecisionRecallScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseTimeReport {
    pub response_time: f64,
    pub is_fast: bool,
    pub is_acceptable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostReport {
    pub cost_per_recommendation: f64,
    pub cost_efficiency: f64,
    /// Only present when the result carried a cost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
}

/// Value produced by a single metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    PrecisionRecall(PrecisionRecallScores),
    ResponseTime(ResponseTimeReport),
    Cost(CostReport),
    /// Named fields, for custom metrics.
    Record(BTreeMap<String, f64>),
}

impl MetricValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_precision_recall(&self) -> Option<&PrecisionRecallScores> {
        match self {
            MetricValue::PrecisionRecall(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_response_time(&self) -> Option<&ResponseTimeReport> {
        match self {
            MetricValue::ResponseTime(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_cost(&self) -> Option<&CostReport> {
        match self {
            MetricValue::Cost(c) => Some(c),
            _ => None,
        }
    }
}

/// The built-in metric set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinMetric {
    PrecisionRecall { k: usize },
    Ndcg { k: usize },
    UserSatisfaction,
    ResponseTime,
    CostEfficiency,
}

impl BuiltinMetric {
    /// Short label used in log lines, e.g. `NDCG@10`.
    pub fn label(&self) -> String {
        match self {
            BuiltinMetric::PrecisionRecall { k } => format!("PrecisionRecall@{}", k),
            BuiltinMetric::Ndcg { k } => format!("NDCG@{}", k),
            BuiltinMetric::UserSatisfaction => "UserSatisfaction".to_string(),
            BuiltinMetric::ResponseTime => "ResponseTime".to_string(),
            BuiltinMetric::CostEfficiency => "CostEfficiency".to_string(),
        }
    }
}

impl Metric for BuiltinMetric {
    fn compute(&self, result: &RecommendationResult, ground_truth: &[GroundTruthItem]) -> Result<MetricValue> {
        let recs = &result.recommendations;
        Ok(match *self {
            BuiltinMetric::PrecisionRecall { k } => {
                MetricValue::PrecisionRecall(precision_recall_at_k(recs, ground_truth, k)?)
            }
            BuiltinMetric::Ndcg { k } => MetricValue::Scalar(ndcg_at_k(recs, ground_truth, k)?),
            BuiltinMetric::UserSatisfaction => MetricValue::Scalar(user_satisfaction(recs, ground_truth)?),
            BuiltinMetric::ResponseTime => MetricValue::ResponseTime(response_time_report(result.response_time)),
            BuiltinMetric::CostEfficiency => MetricValue::Cost(cost_efficiency(result, ground_truth)?),
        })
    }

    fn describe(&self) -> String {
        match self {
            BuiltinMetric::PrecisionRecall { k } => format!("Precision and recall at {} recommendations", k),
            BuiltinMetric::Ndcg { k } => format!("Normalized Discounted Cumulative Gain at {}", k),
            BuiltinMetric::UserSatisfaction => {
                "User satisfaction score based on recommendation quality and diversity".to_string()
            }
            BuiltinMetric::ResponseTime => "Response time metrics for query processing".to_string(),
            BuiltinMetric::CostEfficiency => "Cost efficiency metrics for LLM API usage".to_string(),
        }
    }
}

/// Precision, recall and F1 over the first `k` recommendations.
///
/// Both ratios are computed on id sets, so ranking order inside the cutoff does
/// not matter. Empty denominators yield 0.0.
pub fn precision_recall_at_k(
    recommendations: &[Recommendation],
    ground_truth: &[GroundTruthItem],
    k: usize,
) -> Result<PrecisionRecallScores> {
    let truth = ground_truth_ids(ground_truth)?;
    let top_k = &recommendations[..k.min(recommendations.len())];
    let recommended = recommended_ids(top_k);

    let true_positives = recommended.intersection(&truth).count() as f64;
    let precision = if recommended.is_empty() {
        0.0
    } else {
        true_positives / recommended.len() as f64
    };
    let recall = if truth.is_empty() {
        0.0
    } else {
        true_positives / truth.len() as f64
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(PrecisionRecallScores { precision, recall, f1 })
}

/// Normalized Discounted Cumulative Gain over the first `k` recommendations,
/// with binary relevance (1.0 if the id is in ground truth).
///
/// The ideal ranking places `min(|ground truth|, k)` relevant items first.
/// Returns 0.0 when there is nothing to rank or nothing relevant.
pub fn ndcg_at_k(recommendations: &[Recommendation], ground_truth: &[GroundTruthItem], k: usize) -> Result<f64> {
    let truth = ground_truth_ids(ground_truth)?;
    if recommendations.is_empty() || k == 0 {
        return Ok(0.0);
    }

    let relevance = recommendations.iter().take(k).map(|rec| match &rec.id {
        Some(id) if truth.contains(id) => 1.0,
        _ => 0.0,
    });
    let dcg = discounted_gain(relevance);
    let idcg = discounted_gain(std::iter::repeat(1.0).take(truth.len().min(k)));

    Ok(if idcg > 0.0 { dcg / idcg } else { 0.0 })
}

/// Sum of `rel_i / log2(i + 2)` for 0-indexed positions.
fn discounted_gain(relevance: impl Iterator<Item = f64>) -> f64 {
    relevance
        .enumerate()
        .map(|(i, rel)| rel / ((i + 2) as f64).log2())
        .sum()
}

/// Heuristic satisfaction in [0, 1]: mean of genre diversity and id overlap quality.
pub fn user_satisfaction(recommendations: &[Recommendation], ground_truth: &[GroundTruthItem]) -> Result<f64> {
    if recommendations.is_empty() {
        return Ok(0.0);
    }
    let diversity = genre_diversity(recommendations);
    let quality = overlap_quality(recommendations, ground_truth)?;
    Ok((diversity + quality) / 2.0)
}

/// Distinct genres pooled across all recommendations, per recommendation, capped at 1.0.
/// Fewer than two recommendations have no diversity.
fn genre_diversity(recommendations: &[Recommendation]) -> f64 {
    if recommendations.len() < 2 {
        return 0.0;
    }
    let genres: HashSet<&str> = recommendations
        .iter()
        .filter_map(|rec| rec.genres.as_ref())
        .flatten()
        .map(String::as_str)
        .collect();
    (genres.len() as f64 / recommendations.len() as f64).min(1.0)
}

/// Fraction of recommended ids that appear in ground truth; 0.0 with no recommended ids.
fn overlap_quality(recommendations: &[Recommendation], ground_truth: &[GroundTruthItem]) -> Result<f64> {
    let truth = ground_truth_ids(ground_truth)?;
    let recommended = recommended_ids(recommendations);
    if recommended.is_empty() {
        return Ok(0.0);
    }
    Ok(recommended.intersection(&truth).count() as f64 / recommended.len() as f64)
}

/// Classify a response time against the fixed fast/acceptable thresholds (strict `<`).
pub fn response_time_report(response_time: f64) -> ResponseTimeReport {
    ResponseTimeReport {
        response_time,
        is_fast: response_time < FAST_RESPONSE_SECS,
        is_acceptable: response_time < ACCEPTABLE_RESPONSE_SECS,
    }
}

/// Cost per recommendation and quality per unit of cost.
///
/// An unknown cost yields zeros and no `total_cost`.
pub fn cost_efficiency(result: &RecommendationResult, ground_truth: &[GroundTruthItem]) -> Result<CostReport> {
    let cost = match result.cost {
        Some(cost) => cost,
        None => {
            return Ok(CostReport {
                cost_per_recommendation: 0.0,
                cost_efficiency: 0.0,
                total_cost: None,
            })
        }
    };

    let recs = &result.recommendations;
    let cost_per_recommendation = if recs.is_empty() {
        0.0
    } else {
        cost / recs.len() as f64
    };
    let quality = if recs.is_empty() {
        0.0
    } else {
        overlap_quality(recs, ground_truth)?
    };
    let cost_efficiency = if cost > 0.0 { quality / cost } else { 0.0 };

    Ok(CostReport {
        cost_per_recommendation,
        cost_efficiency,
        total_cost: Some(cost),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use serde_json::json;

    const EPS: f64 = 1e-9;

    fn recs(ids: &[i64]) -> Vec<Recommendation> {
        ids.iter().map(|&id| Recommendation::new(id)).collect()
    }

    fn truth(ids: &[i64]) -> Vec<GroundTruthItem> {
        ids.iter().map(|&id| GroundTruthItem::new(id)).collect()
    }

    fn result_of(recommendations: Vec<Recommendation>) -> RecommendationResult {
        RecommendationResult::new(recommendations, "test", 0.5)
    }

    #[test]
    fn precision_recall_perfect_precision() {
        let scores = precision_recall_at_k(&recs(&[1, 2]), &truth(&[1, 2, 3]), 5).unwrap();
        assert!((scores.precision - 1.0).abs() < EPS);
        assert!((scores.recall - 2.0 / 3.0).abs() < EPS);
        let expected_f1 = 2.0 * (1.0 * 2.0 / 3.0) / (1.0 + 2.0 / 3.0);
        assert!((scores.f1 - expected_f1).abs() < EPS);
    }

    #[test]
    fn precision_recall_partial() {
        let scores = precision_recall_at_k(&recs(&[1, 4, 2]), &truth(&[1, 2, 3]), 5).unwrap();
        assert!((scores.precision - 2.0 / 3.0).abs() < EPS);
        assert!((scores.recall - 2.0 / 3.0).abs() < EPS);
        assert!((scores.f1 - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn precision_recall_no_overlap() {
        let scores = precision_recall_at_k(&recs(&[4, 5]), &truth(&[1, 2, 3]), 5).unwrap();
        assert_eq!(scores, PrecisionRecallScores { precision: 0.0, recall: 0.0, f1: 0.0 });
    }

    #[test]
    fn precision_recall_empty_recommendations() {
        let scores = precision_recall_at_k(&[], &truth(&[1, 2, 3]), 5).unwrap();
        assert_eq!(scores, PrecisionRecallScores { precision: 0.0, recall: 0.0, f1: 0.0 });
    }

    #[test]
    fn precision_recall_empty_ground_truth() {
        let scores = precision_recall_at_k(&recs(&[1, 2]), &[], 5).unwrap();
        assert_eq!(scores.precision, 0.0);
        assert_eq!(scores.recall, 0.0);
        assert_eq!(scores.f1, 0.0);
    }

    #[test]
    fn precision_recall_respects_cutoff() {
        // Only the first two are considered; the relevant 3 falls outside.
        let scores = precision_recall_at_k(&recs(&[1, 9, 3]), &truth(&[1, 3]), 2).unwrap();
        assert!((scores.precision - 0.5).abs() < EPS);
        assert!((scores.recall - 0.5).abs() < EPS);
    }

    #[test]
    fn precision_recall_zero_k_considers_nothing() {
        let scores = precision_recall_at_k(&recs(&[1, 2]), &truth(&[1, 2]), 0).unwrap();
        assert_eq!(scores.precision, 0.0);
        assert_eq!(scores.recall, 0.0);
    }

    #[test]
    fn precision_recall_ignores_order_and_missing_ids() {
        let mut shuffled = recs(&[2, 1]);
        shuffled.insert(1, Recommendation::default().with_field("title", "Untitled"));
        let a = precision_recall_at_k(&recs(&[1, 2]), &truth(&[1, 2, 3]), 5).unwrap();
        let b = precision_recall_at_k(&shuffled, &truth(&[1, 2, 3]), 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn precision_recall_f1_is_harmonic_mean() {
        let scores = precision_recall_at_k(&recs(&[1, 5, 6, 7]), &truth(&[1, 2]), 10).unwrap();
        let (p, r) = (scores.precision, scores.recall);
        assert!((p - 0.25).abs() < EPS);
        assert!((r - 0.5).abs() < EPS);
        assert!((scores.f1 - 2.0 * p * r / (p + r)).abs() < EPS);
    }

    #[test]
    fn ndcg_perfect_ranking() {
        let ndcg = ndcg_at_k(&recs(&[1, 2, 3]), &truth(&[1, 2, 3]), 5).unwrap();
        assert!((ndcg - 1.0).abs() < EPS);
    }

    #[test]
    fn ndcg_no_relevant_items() {
        assert_eq!(ndcg_at_k(&recs(&[4, 5]), &truth(&[1, 2, 3]), 5).unwrap(), 0.0);
    }

    #[test]
    fn ndcg_partial_ranking() {
        let ndcg = ndcg_at_k(&recs(&[1, 4, 2]), &truth(&[1, 2, 3]), 5).unwrap();
        let dcg = 1.0 + 1.0 / 4f64.log2();
        let idcg = 1.0 + 1.0 / 3f64.log2() + 1.0 / 4f64.log2();
        assert!((ndcg - dcg / idcg).abs() < EPS);
        assert!(ndcg > 0.0 && ndcg < 1.0);
    }

    #[test]
    fn ndcg_empty_inputs() {
        assert_eq!(ndcg_at_k(&[], &truth(&[1]), 5).unwrap(), 0.0);
        assert_eq!(ndcg_at_k(&recs(&[1]), &[], 5).unwrap(), 0.0);
    }

    #[test]
    fn ndcg_ideal_capped_at_k() {
        // Five relevant items but k = 2: a perfect top-2 scores 1.0.
        let ndcg = ndcg_at_k(&recs(&[1, 2, 3]), &truth(&[1, 2, 3, 4, 5]), 2).unwrap();
        assert!((ndcg - 1.0).abs() < EPS);
    }

    #[test]
    fn ndcg_ignores_ground_truth_order() {
        let a = ndcg_at_k(&recs(&[3, 7, 1]), &truth(&[1, 2, 3]), 5).unwrap();
        let b = ndcg_at_k(&recs(&[3, 7, 1]), &truth(&[3, 1, 2]), 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ndcg_rewards_earlier_relevant_items() {
        let late = ndcg_at_k(&recs(&[7, 8, 1]), &truth(&[1]), 5).unwrap();
        let middle = ndcg_at_k(&recs(&[7, 1, 8]), &truth(&[1]), 5).unwrap();
        let early = ndcg_at_k(&recs(&[1, 7, 8]), &truth(&[1]), 5).unwrap();
        assert!(late < middle);
        assert!(middle < early);
        assert!((early - 1.0).abs() < EPS);
    }

    #[test]
    fn ndcg_missing_id_counts_as_irrelevant() {
        let ranked = vec![Recommendation::default(), Recommendation::new(1)];
        let ndcg = ndcg_at_k(&ranked, &truth(&[1]), 5).unwrap();
        assert!((ndcg - 1.0 / 3f64.log2()).abs() < EPS);
    }

    #[test]
    fn satisfaction_high_with_good_overlap() {
        let ranked = vec![
            Recommendation::new(1).with_genres(["Action"]),
            Recommendation::new(2).with_genres(["Comedy"]),
        ];
        let score = user_satisfaction(&ranked, &truth(&[1, 2])).unwrap();
        assert!((score - 1.0).abs() < EPS);
    }

    #[test]
    fn satisfaction_low_without_overlap() {
        let ranked = vec![
            Recommendation::new(3).with_genres(["Drama"]),
            Recommendation::new(4).with_genres(["Horror"]),
        ];
        let score = user_satisfaction(&ranked, &truth(&[1, 2])).unwrap();
        // Full genre diversity, zero quality.
        assert!((score - 0.5).abs() < EPS);
    }

    #[test]
    fn satisfaction_pools_genres() {
        // One item with many genres: 4 distinct genres over 2 items is capped at 1.0.
        let ranked = vec![
            Recommendation::new(9).with_genres(["Action", "Comedy", "Drama", "Horror"]),
            Recommendation::new(8),
        ];
        assert!((genre_diversity(&ranked) - 1.0).abs() < EPS);

        let shared = vec![
            Recommendation::new(1).with_genres(["Action"]),
            Recommendation::new(2).with_genres(["Action"]),
            Recommendation::new(3).with_genres(["Action", "Drama"]),
        ];
        assert!((genre_diversity(&shared) - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn satisfaction_single_item_has_no_diversity() {
        let ranked = vec![Recommendation::new(1).with_genres(["Action", "Drama"])];
        let score = user_satisfaction(&ranked, &truth(&[1])).unwrap();
        assert!((score - 0.5).abs() < EPS);
    }

    #[test]
    fn satisfaction_empty_recommendations() {
        assert_eq!(user_satisfaction(&[], &truth(&[1])).unwrap(), 0.0);
    }

    #[test]
    fn response_time_fast() {
        let report = response_time_report(0.1);
        assert_eq!(report.response_time, 0.1);
        assert!(report.is_fast);
        assert!(report.is_acceptable);
    }

    #[test]
    fn response_time_slow() {
        let report = response_time_report(2.0);
        assert_eq!(report.response_time, 2.0);
        assert!(!report.is_fast);
        assert!(!report.is_acceptable);
    }

    #[test]
    fn response_time_boundaries_are_strict() {
        assert!(!response_time_report(0.2).is_fast);
        assert!(response_time_report(0.2).is_acceptable);
        assert!(!response_time_report(1.0).is_acceptable);
    }

    #[test]
    fn cost_efficiency_with_cost() {
        let result = result_of(recs(&[1])).with_cost(0.01);
        let report = cost_efficiency(&result, &truth(&[1])).unwrap();
        assert!((report.cost_per_recommendation - 0.01).abs() < EPS);
        assert_eq!(report.total_cost, Some(0.01));
        assert!((report.cost_efficiency - 100.0).abs() < 1e-6);
    }

    #[test]
    fn cost_efficiency_without_cost_omits_total() {
        let result = result_of(recs(&[1]));
        let report = cost_efficiency(&result, &truth(&[1])).unwrap();
        assert_eq!(report.cost_per_recommendation, 0.0);
        assert_eq!(report.cost_efficiency, 0.0);
        assert_eq!(report.total_cost, None);
        assert_eq!(
            serde_json::to_value(MetricValue::Cost(report)).unwrap(),
            json!({"cost_per_recommendation": 0.0, "cost_efficiency": 0.0})
        );
    }

    #[test]
    fn cost_efficiency_zero_cost() {
        let result = result_of(recs(&[1, 2])).with_cost(0.0);
        let report = cost_efficiency(&result, &truth(&[1])).unwrap();
        assert_eq!(report.cost_per_recommendation, 0.0);
        assert_eq!(report.cost_efficiency, 0.0);
        assert_eq!(report.total_cost, Some(0.0));
    }

    #[test]
    fn cost_efficiency_empty_recommendations() {
        let result = result_of(Vec::new()).with_cost(0.5);
        let report = cost_efficiency(&result, &truth(&[1])).unwrap();
        assert_eq!(report.cost_per_recommendation, 0.0);
        assert_eq!(report.cost_efficiency, 0.0);
        assert_eq!(report.total_cost, Some(0.5));
    }

    #[test]
    fn malformed_ground_truth_is_an_error() {
        let bad = vec![GroundTruthItem::new(1), GroundTruthItem::default()];
        assert!(matches!(
            precision_recall_at_k(&recs(&[1]), &bad, 5),
            Err(EvalError::MissingGroundTruthId { index: 1 })
        ));
        assert!(ndcg_at_k(&recs(&[1]), &bad, 5).is_err());
        assert!(user_satisfaction(&recs(&[1]), &bad).is_err());
        // Id sets are built before the empty-ranking guard.
        assert!(precision_recall_at_k(&[], &bad, 5).is_err());
        assert!(ndcg_at_k(&[], &bad, 5).is_err());
    }

    #[test]
    fn cost_efficiency_malformed_ground_truth() {
        let bad = vec![GroundTruthItem::default()];
        let priced = result_of(recs(&[1])).with_cost(0.01);
        assert!(matches!(
            cost_efficiency(&priced, &bad),
            Err(EvalError::MissingGroundTruthId { index: 0 })
        ));
    }

    #[test]
    fn short_circuits_skip_ground_truth() {
        let bad = vec![GroundTruthItem::new(1), GroundTruthItem::default()];

        let unpriced = cost_efficiency(&result_of(recs(&[1])), &bad).unwrap();
        assert_eq!(unpriced.total_cost, None);
        assert_eq!(unpriced.cost_efficiency, 0.0);

        let empty = cost_efficiency(&result_of(Vec::new()).with_cost(0.2), &bad).unwrap();
        assert_eq!(empty.cost_per_recommendation, 0.0);
        assert_eq!(empty.cost_efficiency, 0.0);
        assert_eq!(empty.total_cost, Some(0.2));

        assert_eq!(user_satisfaction(&[], &bad).unwrap(), 0.0);
    }

    #[test]
    fn builtin_descriptions_and_labels() {
        let pr = BuiltinMetric::PrecisionRecall { k: 5 };
        assert_eq!(pr.describe(), "Precision and recall at 5 recommendations");
        assert_eq!(pr.label(), "PrecisionRecall@5");
        assert_eq!(BuiltinMetric::Ndcg { k: 10 }.label(), "NDCG@10");
        for metric in [
            BuiltinMetric::UserSatisfaction,
            BuiltinMetric::ResponseTime,
            BuiltinMetric::CostEfficiency,
        ] {
            assert!(!metric.describe().is_empty());
        }
    }

    #[test]
    fn builtin_compute_dispatches() {
        let result = result_of(recs(&[1, 4, 2])).with_cost(0.03);
        let gt = truth(&[1, 2, 3]);
        let pr = BuiltinMetric::PrecisionRecall { k: 5 }.compute(&result, &gt).unwrap();
        assert!(pr.as_precision_recall().is_some());
        let ndcg = BuiltinMetric::Ndcg { k: 5 }.compute(&result, &gt).unwrap();
        assert!(ndcg.as_scalar().unwrap() > 0.0);
        let rt = BuiltinMetric::ResponseTime.compute(&result, &gt).unwrap();
        assert_eq!(rt.as_response_time().unwrap().response_time, 0.5);
        let cost = BuiltinMetric::CostEfficiency.compute(&result, &gt).unwrap();
        assert_eq!(cost.as_cost().unwrap().total_cost, Some(0.03));
    }
}
