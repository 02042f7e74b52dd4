//! Machine-readable report of an evaluation run.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::eval::case::EvalCase;
use crate::eval::registry::MetricOutcome;
use crate::eval::summary::{summarize, PipelineSummary};

/// Outcomes of one case. Cases are kept in input order, so two pipelines may
/// share a case name.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport<'a> {
    pub name: &'a str,
    pub pipeline: &'a str,
    pub outcomes: &'a BTreeMap<String, MetricOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalReport<'a> {
    pub cases: Vec<CaseReport<'a>>,
    pub summaries: BTreeMap<String, PipelineSummary>,
}

impl<'a> EvalReport<'a> {
    /// Pair each case with its outcomes (same order) and summarize per pipeline.
    pub fn new(cases: &'a [EvalCase], evaluations: &'a [BTreeMap<String, MetricOutcome>]) -> Self {
        let cases: Vec<CaseReport<'a>> = cases
            .iter()
            .zip(evaluations)
            .map(|(case, outcomes)| CaseReport {
                name: &case.name,
                pipeline: &case.pipeline,
                outcomes,
            })
            .collect();
        let summaries = summarize(cases.iter().map(|c| (c.pipeline, c.outcomes)));
        Self { cases, summaries }
    }
}
