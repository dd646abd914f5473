use serde::{Deserialize, Serialize};

use super::ids::ModelId;

/// Raw judgment totals for one model, as produced by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardTotals {
    pub model_id: ModelId,
    pub model_name: String,
    pub total_judgments: i64,
    pub total_score: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub total_runs: i64,
    pub successful_runs: i64,
    pub failed_runs: i64,
}
