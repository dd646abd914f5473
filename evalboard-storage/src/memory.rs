use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evalboard_core::{
    CoreError, Eval, EvalFilter, EvalId, EvalStore, HealthCheck, Judgment, JudgmentFilter,
    JudgmentId, JudgmentStore, LeaderboardTotals, Model, ModelId, ModelStats, ModelStore, Result,
    ResultFilter, ResultId, ResultStore, RunResult,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    models: Vec<Model>,
    evals: Vec<Eval>,
    results: Vec<RunResult>,
    judgments: Vec<Judgment>,
}

impl Tables {
    fn has_model(&self, id: &ModelId) -> bool {
        self.models.iter().any(|m| m.id == *id)
    }

    fn has_eval(&self, id: &EvalId) -> bool {
        self.evals.iter().any(|e| e.id == *id)
    }

    fn purge_eval_children(&mut self, eval_ids: &[EvalId]) {
        self.results.retain(|r| !eval_ids.contains(&r.eval_id));
        self.judgments.retain(|j| !eval_ids.contains(&j.eval_id));
    }
}

/// In-process store with the same semantics as the Postgres repositories:
/// foreign keys are checked on insert, deletes cascade, listings are newest
/// first.
///
/// Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, ties broken by descending id, as `ORDER BY created_at DESC, id DESC`.
fn newest_first<T: Clone>(
    rows: &[T],
    keep: impl Fn(&T) -> bool,
    sort_key: impl Fn(&T) -> (DateTime<Utc>, Uuid),
) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().filter(|r| keep(r)).cloned().collect();
    out.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    out
}

fn missing_reference(kind: &str, id: impl std::fmt::Display) -> CoreError {
    CoreError::Conflict(format!("referenced {} {} does not exist", kind, id))
}

fn duplicate(kind: &str, id: impl std::fmt::Display) -> CoreError {
    CoreError::Conflict(format!("{} {} already exists", kind, id))
}

#[async_trait]
impl ModelStore for MemoryStore {
    async fn create_model(&self, model: &Model) -> Result<Model> {
        let mut tables = self.tables.write().await;
        if tables.has_model(&model.id) {
            return Err(duplicate("model", model.id));
        }
        tables.models.push(model.clone());
        Ok(model.clone())
    }

    async fn get_model(&self, id: &ModelId) -> Result<Option<Model>> {
        let tables = self.tables.read().await;
        Ok(tables.models.iter().find(|m| m.id == *id).cloned())
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.models, |_| true, |m| (m.created_at, m.id.0)))
    }

    async fn update_model(&self, model: &Model) -> Result<Model> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .models
            .iter_mut()
            .find(|m| m.id == model.id)
            .ok_or_else(|| CoreError::not_found("model", model.id))?;
        // created_at is immutable, as in the SQL update.
        let created_at = slot.created_at;
        *slot = Model {
            created_at,
            ..model.clone()
        };
        Ok(slot.clone())
    }

    async fn delete_model(&self, id: &ModelId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.models.len();
        tables.models.retain(|m| m.id != *id);
        if tables.models.len() == before {
            return Ok(false);
        }

        let orphaned: Vec<EvalId> = tables
            .evals
            .iter()
            .filter(|e| e.creator_model_id == *id)
            .map(|e| e.id)
            .collect();
        tables.evals.retain(|e| e.creator_model_id != *id);
        tables.purge_eval_children(&orphaned);
        tables.results.retain(|r| r.model_id != *id);
        tables.judgments.retain(|j| j.judge_model_id != *id);
        Ok(true)
    }
}

#[async_trait]
impl EvalStore for MemoryStore {
    async fn create_eval(&self, eval: &Eval) -> Result<Eval> {
        let mut tables = self.tables.write().await;
        if !tables.has_model(&eval.creator_model_id) {
            return Err(missing_reference("model", eval.creator_model_id));
        }
        if tables.has_eval(&eval.id) {
            return Err(duplicate("eval", eval.id));
        }
        tables.evals.push(eval.clone());
        Ok(eval.clone())
    }

    async fn get_eval(&self, id: &EvalId) -> Result<Option<Eval>> {
        let tables = self.tables.read().await;
        Ok(tables.evals.iter().find(|e| e.id == *id).cloned())
    }

    async fn list_evals(&self, filter: &EvalFilter) -> Result<Vec<Eval>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            &tables.evals,
            |e| filter.matches(e),
            |e| (e.created_at, e.id.0),
        ))
    }

    async fn update_eval(&self, eval: &Eval) -> Result<Eval> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .evals
            .iter_mut()
            .find(|e| e.id == eval.id)
            .ok_or_else(|| CoreError::not_found("eval", eval.id))?;
        slot.question_text = eval.question_text.clone();
        slot.tags = eval.tags.clone();
        slot.difficulty = eval.difficulty;
        slot.metadata = eval.metadata.clone();
        Ok(slot.clone())
    }

    async fn delete_eval(&self, id: &EvalId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.evals.len();
        tables.evals.retain(|e| e.id != *id);
        if tables.evals.len() == before {
            return Ok(false);
        }
        tables.purge_eval_children(&[*id]);
        Ok(true)
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn create_result(&self, result: &RunResult) -> Result<RunResult> {
        let mut tables = self.tables.write().await;
        if !tables.has_eval(&result.eval_id) {
            return Err(missing_reference("eval", result.eval_id));
        }
        if !tables.has_model(&result.model_id) {
            return Err(missing_reference("model", result.model_id));
        }
        if tables.results.iter().any(|r| r.id == result.id) {
            return Err(duplicate("result", result.id));
        }
        tables.results.push(result.clone());
        Ok(result.clone())
    }

    async fn get_result(&self, id: &ResultId) -> Result<Option<RunResult>> {
        let tables = self.tables.read().await;
        Ok(tables.results.iter().find(|r| r.id == *id).cloned())
    }

    async fn list_results(&self, filter: &ResultFilter) -> Result<Vec<RunResult>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            &tables.results,
            |r| filter.matches(r),
            |r| (r.created_at, r.id.0),
        ))
    }

    async fn update_result(&self, result: &RunResult) -> Result<RunResult> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .results
            .iter_mut()
            .find(|r| r.id == result.id)
            .ok_or_else(|| CoreError::not_found("result", result.id))?;
        slot.response_text = result.response_text.clone();
        slot.error_log = result.error_log.clone();
        Ok(slot.clone())
    }

    async fn delete_result(&self, id: &ResultId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.results.len();
        tables.results.retain(|r| r.id != *id);
        Ok(tables.results.len() < before)
    }

    async fn model_stats(&self, model_id: &ModelId) -> Result<ModelStats> {
        let tables = self.tables.read().await;
        let runs = tables.results.iter().filter(|r| r.model_id == *model_id);
        let (total_runs, failed_runs) = runs.fold((0i64, 0i64), |(total, failed), r| {
            (total + 1, failed + i64::from(r.is_failure()))
        });

        Ok(ModelStats {
            total_runs,
            successful_runs: total_runs - failed_runs,
            failed_runs,
        })
    }
}

#[async_trait]
impl JudgmentStore for MemoryStore {
    async fn create_judgment(&self, judgment: &Judgment) -> Result<Judgment> {
        let mut tables = self.tables.write().await;
        if !tables.has_eval(&judgment.eval_id) {
            return Err(missing_reference("eval", judgment.eval_id));
        }
        if !tables.has_model(&judgment.judge_model_id) {
            return Err(missing_reference("model", judgment.judge_model_id));
        }
        if tables.judgments.iter().any(|j| j.id == judgment.id) {
            return Err(duplicate("judgment", judgment.id));
        }
        tables.judgments.push(judgment.clone());
        Ok(judgment.clone())
    }

    async fn get_judgment(&self, id: &JudgmentId) -> Result<Option<Judgment>> {
        let tables = self.tables.read().await;
        Ok(tables.judgments.iter().find(|j| j.id == *id).cloned())
    }

    async fn list_judgments(&self, filter: &JudgmentFilter) -> Result<Vec<Judgment>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            &tables.judgments,
            |j| filter.matches(j),
            |j| (j.created_at, j.id.0),
        ))
    }

    async fn update_judgment(&self, judgment: &Judgment) -> Result<Judgment> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .judgments
            .iter_mut()
            .find(|j| j.id == judgment.id)
            .ok_or_else(|| CoreError::not_found("judgment", judgment.id))?;
        slot.score = judgment.score;
        slot.justification_text = judgment.justification_text.clone();
        Ok(slot.clone())
    }

    async fn delete_judgment(&self, id: &JudgmentId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.judgments.len();
        tables.judgments.retain(|j| j.id != *id);
        Ok(tables.judgments.len() < before)
    }

    async fn leaderboard_totals(&self) -> Result<Vec<LeaderboardTotals>> {
        let tables = self.tables.read().await;
        let models = newest_first(&tables.models, |_| true, |m| (m.created_at, m.id.0));

        Ok(models
            .into_iter()
            .map(|model| {
                let mut total_judgments = 0i64;
                let mut total_score = 0.0f64;
                for result in tables.results.iter().filter(|r| r.model_id == model.id) {
                    for judgment in tables.judgments.iter().filter(|j| j.eval_id == result.eval_id) {
                        total_judgments += 1;
                        total_score += judgment.score;
                    }
                }
                LeaderboardTotals {
                    model_id: model.id,
                    model_name: model.name,
                    total_judgments,
                    total_score,
                }
            })
            .collect())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn check(&self) -> Result<()> {
        let _tables = self.tables.read().await;
        Ok(())
    }
}
