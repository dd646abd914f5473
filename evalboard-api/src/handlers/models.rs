use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use evalboard_core::{CoreError, EvalFilter, JudgmentFilter, Model, ModelId, ResultFilter};
use evalboard_metrics::RunStatsAggregator;
use validator::Validate;

use crate::{dto::*, error::{ApiError, ApiResult}, AppState};

async fn load(state: &AppState, id: &ModelId) -> ApiResult<Model> {
    state
        .stores
        .models
        .get_model(id)
        .await?
        .ok_or_else(|| CoreError::not_found("model", id).into())
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateModelRequest>,
) -> ApiResult<(StatusCode, Json<ModelResponse>)> {
    payload.validate()?;

    let model = state.stores.models.create_model(&Model::from(payload)).await?;
    tracing::info!(model_id = %model.id, name = %model.name, "Registered model");

    Ok((StatusCode::CREATED, Json(ModelResponse::from(model))))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ModelResponse>>> {
    let models = state.stores.models.list_models().await?;
    Ok(Json(models.into_iter().map(ModelResponse::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> ApiResult<Json<ModelDetailResponse>> {
    let model = load(&state, &id).await?;

    let evals = state
        .stores
        .evals
        .list_evals(&EvalFilter {
            creator_model_ids: Some(vec![id]),
            ..Default::default()
        })
        .await?;
    let results = state
        .stores
        .results
        .list_results(&ResultFilter {
            eval_id: None,
            model_id: Some(id),
        })
        .await?;
    let judgments = state
        .stores
        .judgments
        .list_judgments(&JudgmentFilter {
            eval_id: None,
            judge_model_id: Some(id),
        })
        .await?;

    Ok(Json(ModelDetailResponse {
        model: ModelResponse::from(model),
        evals,
        results,
        judgments,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
    ApiJson(payload): ApiJson<UpdateModelRequest>,
) -> ApiResult<Json<ModelResponse>> {
    payload.validate()?;

    let mut model = load(&state, &id).await?;
    model.apply(payload.into());
    let model = state.stores.models.update_model(&model).await?;

    Ok(Json(ModelResponse::from(model)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> ApiResult<StatusCode> {
    if state.stores.models.delete_model(&id).await? {
        tracing::info!(model_id = %id, "Deleted model");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("model {} not found", id)))
    }
}

pub async fn stats(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> ApiResult<Json<ModelStatsResponse>> {
    load(&state, &id).await?;
    let stats = state.stores.results.model_stats(&id).await?;

    Ok(Json(ModelStatsResponse {
        success_rate: RunStatsAggregator::success_rate(&stats),
        stats,
    }))
}
