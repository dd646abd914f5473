use chrono::{DateTime, Utc};
use evalboard_core::{Eval, Judgment, Model, ModelId, ModelStats, ModelUpdate, RunResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub provider_model_id: String,
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub api_key: String,
}

impl From<CreateModelRequest> for Model {
    fn from(req: CreateModelRequest) -> Self {
        Model::new(req.name, req.provider_model_id, req.base_url, req.api_key)
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub provider_model_id: Option<String>,
    #[validate(url)]
    pub base_url: Option<String>,
    #[validate(length(min = 1))]
    pub api_key: Option<String>,
}

impl From<UpdateModelRequest> for ModelUpdate {
    fn from(req: UpdateModelRequest) -> Self {
        ModelUpdate {
            name: req.name,
            provider_model_id: req.provider_model_id,
            base_url: req.base_url,
            api_key: req.api_key,
        }
    }
}

/// A model as returned over HTTP; the API key is masked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub id: ModelId,
    pub name: String,
    pub provider_model_id: String,
    pub base_url: String,
    pub api_key_hint: String,
    pub created_at: DateTime<Utc>,
}

impl From<Model> for ModelResponse {
    fn from(model: Model) -> Self {
        Self {
            api_key_hint: model.api_key_hint(),
            id: model.id,
            name: model.name,
            provider_model_id: model.provider_model_id,
            base_url: model.base_url,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetailResponse {
    #[serde(flatten)]
    pub model: ModelResponse,
    pub evals: Vec<Eval>,
    pub results: Vec<RunResult>,
    pub judgments: Vec<Judgment>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatsResponse {
    #[serde(flatten)]
    pub stats: ModelStats,
    pub success_rate: f64,
}
