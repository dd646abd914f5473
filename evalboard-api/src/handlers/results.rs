use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use evalboard_core::{CoreError, ResultId, RunResult};
use validator::Validate;

use crate::{dto::*, error::{ApiError, ApiResult}, AppState};

async fn load(state: &AppState, id: &ResultId) -> ApiResult<RunResult> {
    state
        .stores
        .results
        .get_result(id)
        .await?
        .ok_or_else(|| CoreError::not_found("result", id).into())
}

async fn with_relations(
    state: &AppState,
    result: RunResult,
    include_eval: bool,
    include_model: bool,
) -> ApiResult<ResultResponse> {
    let eval = if include_eval {
        state.stores.evals.get_eval(&result.eval_id).await?
    } else {
        None
    };
    let model = if include_model {
        state
            .stores
            .models
            .get_model(&result.model_id)
            .await?
            .map(ModelResponse::from)
    } else {
        None
    };

    Ok(ResultResponse { result, eval, model })
}

pub async fn run(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RunEvalRequest>,
) -> ApiResult<(StatusCode, Json<RunResult>)> {
    let result = state.runner.run(&payload.eval_id, &payload.model_id).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn run_batch(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RunEvalsRequest>,
) -> ApiResult<(StatusCode, Json<BatchResponse<RunResult>>)> {
    payload.validate()?;

    let report = state
        .runner
        .run_batch(&payload.eval_ids, &payload.model_ids)
        .await?;

    Ok((StatusCode::CREATED, Json(BatchResponse::from(report))))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListResultsQuery>,
) -> ApiResult<Json<Vec<ResultResponse>>> {
    let results = state.stores.results.list_results(&query.filter()).await?;

    let mut response = Vec::with_capacity(results.len());
    for result in results {
        response.push(with_relations(&state, result, query.include_eval, query.include_model).await?);
    }

    Ok(Json(response))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ResultId>,
) -> ApiResult<Json<ResultResponse>> {
    let result = load(&state, &id).await?;
    Ok(Json(with_relations(&state, result, true, true).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ResultId>,
    ApiJson(payload): ApiJson<UpdateResultRequest>,
) -> ApiResult<Json<RunResult>> {
    payload.validate()?;

    let mut result = load(&state, &id).await?;
    result.apply(payload.into());
    Ok(Json(state.stores.results.update_result(&result).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ResultId>,
) -> ApiResult<StatusCode> {
    if state.stores.results.delete_result(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("result {} not found", id)))
    }
}
