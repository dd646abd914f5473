use async_trait::async_trait;

use crate::domain::{
    Eval, EvalFilter, EvalId, Judgment, JudgmentFilter, JudgmentId, LeaderboardTotals, Model,
    ModelId, ModelStats, ResultFilter, ResultId, RunResult,
};
use crate::error::Result;

/// Persistence for registered models.
///
/// `delete_model` cascades to the evals the model created, the results it
/// produced and the judgments it authored. It returns `false` when no row
/// existed.
#[async_trait]
pub trait ModelStore: Send + Sync {
    async fn create_model(&self, model: &Model) -> Result<Model>;
    async fn get_model(&self, id: &ModelId) -> Result<Option<Model>>;
    /// Newest first.
    async fn list_models(&self) -> Result<Vec<Model>>;
    async fn update_model(&self, model: &Model) -> Result<Model>;
    async fn delete_model(&self, id: &ModelId) -> Result<bool>;
}

#[async_trait]
pub trait EvalStore: Send + Sync {
    async fn create_eval(&self, eval: &Eval) -> Result<Eval>;
    async fn get_eval(&self, id: &EvalId) -> Result<Option<Eval>>;
    /// Newest first.
    async fn list_evals(&self, filter: &EvalFilter) -> Result<Vec<Eval>>;
    async fn update_eval(&self, eval: &Eval) -> Result<Eval>;
    /// Cascades to the eval's results and judgments.
    async fn delete_eval(&self, id: &EvalId) -> Result<bool>;
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn create_result(&self, result: &RunResult) -> Result<RunResult>;
    async fn get_result(&self, id: &ResultId) -> Result<Option<RunResult>>;
    /// Newest first.
    async fn list_results(&self, filter: &ResultFilter) -> Result<Vec<RunResult>>;
    async fn update_result(&self, result: &RunResult) -> Result<RunResult>;
    async fn delete_result(&self, id: &ResultId) -> Result<bool>;
    async fn model_stats(&self, model_id: &ModelId) -> Result<ModelStats>;
}

#[async_trait]
pub trait JudgmentStore: Send + Sync {
    async fn create_judgment(&self, judgment: &Judgment) -> Result<Judgment>;
    async fn get_judgment(&self, id: &JudgmentId) -> Result<Option<Judgment>>;
    /// Newest first.
    async fn list_judgments(&self, filter: &JudgmentFilter) -> Result<Vec<Judgment>>;
    async fn update_judgment(&self, judgment: &Judgment) -> Result<Judgment>;
    async fn delete_judgment(&self, id: &JudgmentId) -> Result<bool>;
    /// One row per model, in model listing order. Judgments are attributed to
    /// a model through its results: each result of the model on an eval
    /// counts every judgment of that eval.
    async fn leaderboard_totals(&self) -> Result<Vec<LeaderboardTotals>>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> Result<()>;
}
