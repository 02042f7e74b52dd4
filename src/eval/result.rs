//! Recommendation result and ground-truth record types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::{EvalError, Result};

/// Identifier of a recommended or ground-truth item.
///
/// Integer and string ids are never coerced: `1` and `"1"` are different items.
/// An explicit `"id": null` is the id [`ItemId::Null`], which matches other null
/// ids; only an absent `id` key means "no id". Non-integer numbers (`550.0`)
/// are not ids and fail deserialization of the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Text(String),
    Null,
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(n) => write!(f, "{}", n),
            ItemId::Text(s) => f.write_str(s),
            ItemId::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId::Int(id)
    }
}

impl From<i32> for ItemId {
    fn from(id: i32) -> Self {
        ItemId::Int(i64::from(id))
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::Text(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId::Text(id)
    }
}

/// One entry of a ranked recommendation list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Entries without an id are ignored by id-based metrics.
    #[serde(default, deserialize_with = "present_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    /// Descriptive fields (title, year, ...), unused by scoring.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Recommendation {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = Some(genres.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// One reference item considered relevant for a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthItem {
    #[serde(default, deserialize_with = "present_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroundTruthItem {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: Some(id.into()),
            extra: Map::new(),
        }
    }
}

/// Outcome of one recommendation query: the ranking plus its latency and cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Ranked recommendations, best first.
    pub recommendations: Vec<Recommendation>,
    pub query: String,
    /// Seconds spent producing the result.
    pub response_time: f64,
    /// Monetary cost; `None` means unknown, which is not the same as free.
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl RecommendationResult {
    pub fn new(recommendations: Vec<Recommendation>, query: impl Into<String>, response_time: f64) -> Self {
        Self {
            recommendations,
            query: query.into(),
            response_time,
            cost: None,
            metadata: None,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A present `id` key is always `Some`, even when its value is null.
fn present_id<'de, D>(deserializer: D) -> std::result::Result<Option<ItemId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Option::<ItemId>::deserialize(deserializer)?.unwrap_or(ItemId::Null)))
}

/// Set of ids present in `recommendations`, skipping entries without one.
pub(crate) fn recommended_ids(recommendations: &[Recommendation]) -> HashSet<&ItemId> {
    recommendations.iter().filter_map(|r| r.id.as_ref()).collect()
}

/// Set of ground-truth ids. Duplicates collapse; an entry without an id is an error.
pub(crate) fn ground_truth_ids(ground_truth: &[GroundTruthItem]) -> Result<HashSet<&ItemId>> {
    ground_truth
        .iter()
        .enumerate()
        .map(|(index, item)| item.id.as_ref().ok_or(EvalError::MissingGroundTruthId { index }))
        .collect()
}
