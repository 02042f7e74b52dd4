//! Labelled evaluation cases loaded from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EvalError, Result};
use crate::eval::result::{GroundTruthItem, RecommendationResult};

/// One recommendation result paired with the items it should have returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    /// Case name for reporting.
    pub name: String,
    /// Pipeline that produced the result (e.g. `rag`, `graphrag`); cases are
    /// summarized per pipeline.
    #[serde(default = "default_pipeline")]
    pub pipeline: String,
    pub result: RecommendationResult,
    #[serde(default)]
    pub ground_truth: Vec<GroundTruthItem>,
}

fn default_pipeline() -> String {
    "default".to_string()
}

impl EvalCase {
    /// Read a JSON array of cases. An empty array is rejected.
    pub fn load_all(path: &Path) -> Result<Vec<EvalCase>> {
        let json = std::fs::read_to_string(path)?;
        let cases: Vec<EvalCase> = serde_json::from_str(&json)?;
        if cases.is_empty() {
            return Err(EvalError::InvalidInput(format!("No cases in {}", path.display())));
        }
        Ok(cases)
    }
}
