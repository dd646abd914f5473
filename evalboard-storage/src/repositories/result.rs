use async_trait::async_trait;
use evalboard_core::{
    CoreError, EvalId, ModelId, ModelStats, Result, ResultFilter, ResultId, ResultStore,
    RunResult,
};
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

const RESULT_COLUMNS: &str = "id, eval_id, model_id, response_text, error_log, created_at";

pub struct ResultRepository {
    pool: PgPool,
}

impl ResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn build_list_query(filter: &ResultFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {RESULT_COLUMNS} FROM results WHERE TRUE"));

    if let Some(eval_id) = filter.eval_id {
        qb.push(" AND eval_id = ").push_bind(eval_id.0);
    }
    if let Some(model_id) = filter.model_id {
        qb.push(" AND model_id = ").push_bind(model_id.0);
    }

    qb.push(" ORDER BY created_at DESC, id DESC");
    qb
}

#[async_trait]
impl ResultStore for ResultRepository {
    async fn create_result(&self, result: &RunResult) -> Result<RunResult> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO results (id, eval_id, model_id, response_text, error_log, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(result.id.as_uuid())
        .bind(result.eval_id.as_uuid())
        .bind(result.model_id.as_uuid())
        .bind(&result.response_text)
        .bind(&result.error_log)
        .bind(result.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_result(row)
    }

    async fn get_result(&self, id: &ResultId) -> Result<Option<RunResult>> {
        let row = sqlx::query(&format!("SELECT {RESULT_COLUMNS} FROM results WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_result).transpose()
    }

    async fn list_results(&self, filter: &ResultFilter) -> Result<Vec<RunResult>> {
        let mut qb = build_list_query(filter);
        let rows = qb.build().fetch_all(&self.pool).await?;

        rows.into_iter().map(row_to_result).collect()
    }

    async fn update_result(&self, result: &RunResult) -> Result<RunResult> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE results
            SET response_text = $2, error_log = $3
            WHERE id = $1
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(result.id.as_uuid())
        .bind(&result.response_text)
        .bind(&result.error_log)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_result(row),
            None => Err(CoreError::not_found("result", result.id)),
        }
    }

    async fn delete_result(&self, id: &ResultId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM results WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn model_stats(&self, model_id: &ModelId) -> Result<ModelStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_runs,
                COUNT(*) FILTER (WHERE error_log IS NOT NULL AND error_log <> '') AS failed_runs
            FROM results
            WHERE model_id = $1
            "#,
        )
        .bind(model_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        let total_runs: i64 = row.try_get("total_runs")?;
        let failed_runs: i64 = row.try_get("failed_runs")?;

        Ok(ModelStats {
            total_runs,
            successful_runs: total_runs - failed_runs,
            failed_runs,
        })
    }
}

fn row_to_result(row: PgRow) -> Result<RunResult> {
    let id: Uuid = row.try_get("id")?;
    let eval_id: Uuid = row.try_get("eval_id")?;
    let model_id: Uuid = row.try_get("model_id")?;

    Ok(RunResult {
        id: ResultId::from_uuid(id),
        eval_id: EvalId::from_uuid(eval_id),
        model_id: ModelId::from_uuid(model_id),
        response_text: row.try_get("response_text")?,
        error_log: row.try_get("error_log")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_listing_has_no_predicates() {
        let qb = build_list_query(&ResultFilter::default());
        assert!(!qb.sql().contains("eval_id ="));
        assert!(!qb.sql().contains("model_id ="));
    }

    #[test]
    fn both_filters_are_conjunctive() {
        let filter = ResultFilter {
            eval_id: Some(EvalId::new()),
            model_id: Some(ModelId::new()),
        };
        let qb = build_list_query(&filter);
        assert!(qb.sql().contains("eval_id = $1 AND model_id = $2"));
    }
}
