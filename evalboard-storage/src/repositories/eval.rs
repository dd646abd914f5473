use async_trait::async_trait;
use evalboard_core::{
    CoreError, Difficulty, Eval, EvalFilter, EvalId, EvalMetadata, EvalStore, ModelId, Result,
    TagMatch,
};
use sqlx::{postgres::PgRow, types::Json, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

const EVAL_COLUMNS: &str =
    "id, question_text, creator_model_id, tags, difficulty, metadata, created_at";

pub struct EvalRepository {
    pool: PgPool,
}

impl EvalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds the filtered listing query. Metadata filters use JSON paths, so
/// failed evals (no `skillsTested` / `estimatedTimeMinutes`) never match them.
fn build_list_query(filter: &EvalFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {EVAL_COLUMNS} FROM evals WHERE TRUE"));

    if let Some(difficulty) = filter.difficulty {
        qb.push(" AND difficulty = ").push_bind(difficulty.as_str());
    }

    if let (Some(tags), Some(needle)) = (filter.tags(), filter.joined_tags()) {
        match filter.tag_match {
            TagMatch::Substring => {
                qb.push(" AND strpos(tags, ")
                    .push_bind(needle)
                    .push(") > 0");
            }
            TagMatch::Exact => {
                let wanted: Vec<String> = tags.iter().map(|t| t.trim().to_string()).collect();
                qb.push(r" AND regexp_split_to_array(tags, '\s*,\s*') @> ")
                    .push_bind(wanted)
                    .push("::text[]");
            }
        }
    }

    if let Some(creators) = filter.creator_model_ids() {
        let ids: Vec<Uuid> = creators.iter().map(|id| id.0).collect();
        qb.push(" AND creator_model_id = ANY(").push_bind(ids).push(")");
    }

    if let Some(skills) = filter.skills_tested() {
        qb.push(" AND metadata->'skillsTested' @> ")
            .push_bind(Json(skills.to_vec()));
    }

    // bigint holds every u32 bound without wrapping.
    if let Some(range) = filter.time_range() {
        if let Some(min) = range.min {
            qb.push(" AND (metadata->>'estimatedTimeMinutes')::bigint >= ")
                .push_bind(i64::from(min));
        }
        if let Some(max) = range.max {
            qb.push(" AND (metadata->>'estimatedTimeMinutes')::bigint <= ")
                .push_bind(i64::from(max));
        }
    }

    qb.push(" ORDER BY created_at DESC, id DESC");
    qb
}

#[async_trait]
impl EvalStore for EvalRepository {
    async fn create_eval(&self, eval: &Eval) -> Result<Eval> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO evals (
                id, question_text, creator_model_id, tags, difficulty, metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EVAL_COLUMNS}
            "#
        ))
        .bind(eval.id.as_uuid())
        .bind(&eval.question_text)
        .bind(eval.creator_model_id.as_uuid())
        .bind(&eval.tags)
        .bind(eval.difficulty.as_str())
        .bind(Json(&eval.metadata))
        .bind(eval.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_eval(row)
    }

    async fn get_eval(&self, id: &EvalId) -> Result<Option<Eval>> {
        let row = sqlx::query(&format!("SELECT {EVAL_COLUMNS} FROM evals WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_eval).transpose()
    }

    async fn list_evals(&self, filter: &EvalFilter) -> Result<Vec<Eval>> {
        let mut qb = build_list_query(filter);
        let rows = qb.build().fetch_all(&self.pool).await?;

        rows.into_iter().map(row_to_eval).collect()
    }

    async fn update_eval(&self, eval: &Eval) -> Result<Eval> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE evals
            SET question_text = $2, tags = $3, difficulty = $4, metadata = $5
            WHERE id = $1
            RETURNING {EVAL_COLUMNS}
            "#
        ))
        .bind(eval.id.as_uuid())
        .bind(&eval.question_text)
        .bind(&eval.tags)
        .bind(eval.difficulty.as_str())
        .bind(Json(&eval.metadata))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_eval(row),
            None => Err(CoreError::not_found("eval", eval.id)),
        }
    }

    async fn delete_eval(&self, id: &EvalId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM evals WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected() > 0)
    }
}

fn row_to_eval(row: PgRow) -> Result<Eval> {
    let id: Uuid = row.try_get("id")?;
    let creator: Uuid = row.try_get("creator_model_id")?;
    let difficulty: String = row.try_get("difficulty")?;
    let Json(metadata): Json<EvalMetadata> = row.try_get("metadata")?;

    Ok(Eval {
        id: EvalId::from_uuid(id),
        question_text: row.try_get("question_text")?,
        creator_model_id: ModelId::from_uuid(creator),
        tags: row.try_get("tags")?,
        difficulty: difficulty.parse::<Difficulty>()?,
        metadata,
        created_at: row.try_get("created_at")?,
    })
}
