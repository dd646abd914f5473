use async_trait::async_trait;
use evalboard_core::{
    CoreError, EvalId, Judgment, JudgmentFilter, JudgmentId, JudgmentStore, LeaderboardTotals,
    ModelId, Result,
};
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

const JUDGMENT_COLUMNS: &str =
    "id, eval_id, judge_model_id, score, justification_text, created_at";

/// Every result a model produced on an eval picks up every judgment of that
/// eval. Models with no judgments still get a row with zero totals.
const LEADERBOARD_SQL: &str = r#"
    SELECT
        m.id AS model_id,
        m.name AS model_name,
        COUNT(j.id) AS total_judgments,
        COALESCE(SUM(j.score), 0)::float8 AS total_score
    FROM models m
    LEFT JOIN results r ON r.model_id = m.id
    LEFT JOIN judgments j ON j.eval_id = r.eval_id
    GROUP BY m.id, m.name, m.created_at
    ORDER BY m.created_at DESC, m.id DESC
"#;

pub struct JudgmentRepository {
    pool: PgPool,
}

impl JudgmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn build_list_query(filter: &JudgmentFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb =
        QueryBuilder::new(format!("SELECT {JUDGMENT_COLUMNS} FROM judgments WHERE TRUE"));

    if let Some(eval_id) = filter.eval_id {
        qb.push(" AND eval_id = ").push_bind(eval_id.0);
    }
    if let Some(judge_model_id) = filter.judge_model_id {
        qb.push(" AND judge_model_id = ").push_bind(judge_model_id.0);
    }

    qb.push(" ORDER BY created_at DESC, id DESC");
    qb
}

#[async_trait]
impl JudgmentStore for JudgmentRepository {
    async fn create_judgment(&self, judgment: &Judgment) -> Result<Judgment> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO judgments (
                id, eval_id, judge_model_id, score, justification_text, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {JUDGMENT_COLUMNS}
            "#
        ))
        .bind(judgment.id.as_uuid())
        .bind(judgment.eval_id.as_uuid())
        .bind(judgment.judge_model_id.as_uuid())
        .bind(judgment.score)
        .bind(&judgment.justification_text)
        .bind(judgment.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_judgment(row)
    }

    async fn get_judgment(&self, id: &JudgmentId) -> Result<Option<Judgment>> {
        let row = sqlx::query(&format!(
            "SELECT {JUDGMENT_COLUMNS} FROM judgments WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_judgment).transpose()
    }

    async fn list_judgments(&self, filter: &JudgmentFilter) -> Result<Vec<Judgment>> {
        let mut qb = build_list_query(filter);
        let rows = qb.build().fetch_all(&self.pool).await?;

        rows.into_iter().map(row_to_judgment).collect()
    }

    async fn update_judgment(&self, judgment: &Judgment) -> Result<Judgment> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE judgments
            SET score = $2, justification_text = $3
            WHERE id = $1
            RETURNING {JUDGMENT_COLUMNS}
            "#
        ))
        .bind(judgment.id.as_uuid())
        .bind(judgment.score)
        .bind(&judgment.justification_text)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_judgment(row),
            None => Err(CoreError::not_found("judgment", judgment.id)),
        }
    }

    async fn delete_judgment(&self, id: &JudgmentId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM judgments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn leaderboard_totals(&self) -> Result<Vec<LeaderboardTotals>> {
        let rows = sqlx::query(LEADERBOARD_SQL).fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|row| {
                let model_id: Uuid = row.try_get("model_id")?;
                Ok(LeaderboardTotals {
                    model_id: ModelId::from_uuid(model_id),
                    model_name: row.try_get("model_name")?,
                    total_judgments: row.try_get("total_judgments")?,
                    total_score: row.try_get("total_score")?,
                })
            })
            .collect()
    }
}

fn row_to_judgment(row: PgRow) -> Result<Judgment> {
    let id: Uuid = row.try_get("id")?;
    let eval_id: Uuid = row.try_get("eval_id")?;
    let judge_model_id: Uuid = row.try_get("judge_model_id")?;

    Ok(Judgment {
        id: JudgmentId::from_uuid(id),
        eval_id: EvalId::from_uuid(eval_id),
        judge_model_id: ModelId::from_uuid(judge_model_id),
        score: row.try_get("score")?,
        justification_text: row.try_get("justification_text")?,
        created_at: row.try_get("created_at")?,
    })
}
