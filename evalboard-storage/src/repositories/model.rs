use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evalboard_core::{CoreError, Model, ModelId, ModelStore, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

const MODEL_COLUMNS: &str = "id, name, provider_model_id, base_url, api_key, created_at";

pub struct ModelRepository {
    pool: PgPool,
}

impl ModelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModelStore for ModelRepository {
    async fn create_model(&self, model: &Model) -> Result<Model> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO models (id, name, provider_model_id, base_url, api_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MODEL_COLUMNS}
            "#
        ))
        .bind(model.id.as_uuid())
        .bind(&model.name)
        .bind(&model.provider_model_id)
        .bind(&model.base_url)
        .bind(&model.api_key)
        .bind(model.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_model(row)
    }

    async fn get_model(&self, id: &ModelId) -> Result<Option<Model>> {
        let row = sqlx::query(&format!("SELECT {MODEL_COLUMNS} FROM models WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_model).transpose()
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        let rows = sqlx::query(&format!(
            "SELECT {MODEL_COLUMNS} FROM models ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_model).collect()
    }

    async fn update_model(&self, model: &Model) -> Result<Model> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE models
            SET name = $2, provider_model_id = $3, base_url = $4, api_key = $5
            WHERE id = $1
            RETURNING {MODEL_COLUMNS}
            "#
        ))
        .bind(model.id.as_uuid())
        .bind(&model.name)
        .bind(&model.provider_model_id)
        .bind(&model.base_url)
        .bind(&model.api_key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_model(row),
            None => Err(CoreError::not_found("model", model.id)),
        }
    }

    async fn delete_model(&self, id: &ModelId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM models WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected() > 0)
    }
}

fn row_to_model(row: PgRow) -> Result<Model> {
    let id: Uuid = row.try_get("id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Model {
        id: ModelId::from_uuid(id),
        name: row.try_get("name")?,
        provider_model_id: row.try_get("provider_model_id")?,
        base_url: row.try_get("base_url")?,
        api_key: row.try_get("api_key")?,
        created_at,
    })
}
