//! Evaluation framework: recommendation metrics, the metric registry, eval cases, summaries and reports.

pub mod case;
pub mod metrics;
pub mod registry;
pub mod report;
pub mod result;
pub mod summary;

pub use case::EvalCase;
pub use metrics::{
    cost_efficiency, ndcg_at_k, precision_recall_at_k, response_time_report, user_satisfaction, BuiltinMetric,
    CostReport, Metric, MetricValue, PrecisionRecallScores, ResponseTimeReport, ACCEPTABLE_RESPONSE_SECS,
    DEFAULT_K, FAST_RESPONSE_SECS,
};
pub use registry::{MetricOutcome, MetricRegistry};
pub use report::{CaseReport, EvalReport};
pub use result::{GroundTruthItem, ItemId, Recommendation, RecommendationResult};
pub use summary::{summarize, PipelineSummary};
