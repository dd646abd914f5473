use evalboard_core::{LeaderboardTotals, ModelId, ModelStats};
use serde::{Deserialize, Serialize};

/// One leaderboard row. `rank` is only set when the board was ranked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub model_id: ModelId,
    pub model_name: String,
    pub total_judgments: i64,
    pub average_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

pub struct LeaderboardAggregator;

impl LeaderboardAggregator {
    /// Mean judged score, or exactly 0 for a model with no judgments.
    pub fn average(totals: &LeaderboardTotals) -> f64 {
        if totals.total_judgments == 0 {
            return 0.0;
        }
        totals.total_score / totals.total_judgments as f64
    }

    /// Converts store totals into entries, keeping their order.
    pub fn entries(totals: Vec<LeaderboardTotals>) -> Vec<LeaderboardEntry> {
        totals
            .into_iter()
            .map(|t| LeaderboardEntry {
                average_score: Self::average(&t),
                model_id: t.model_id,
                model_name: t.model_name,
                total_judgments: t.total_judgments,
                rank: None,
            })
            .collect()
    }

    /// Stable sort by average score, highest first, then 1-based ranks.
    /// Equal averages keep their input order and get distinct ranks.
    pub fn rank(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
        entries.sort_by(|a, b| b.average_score.total_cmp(&a.average_score));
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = Some(i + 1);
        }
        tracing::debug!(models = entries.len(), "Ranked leaderboard");
        entries
    }

    pub fn build(totals: Vec<LeaderboardTotals>, ranked: bool) -> Vec<LeaderboardEntry> {
        let entries = Self::entries(totals);
        if ranked {
            Self::rank(entries)
        } else {
            entries
        }
    }
}

pub struct RunStatsAggregator;

impl RunStatsAggregator {
    /// Fraction of runs that succeeded; 0 when the model has no runs.
    pub fn success_rate(stats: &ModelStats) -> f64 {
        if stats.total_runs == 0 {
            return 0.0;
        }
        stats.successful_runs as f64 / stats.total_runs as f64
    }
}
