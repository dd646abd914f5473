use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use evalboard_core::{CoreError, Eval, EvalId, JudgmentFilter, ModelId, ResultFilter};
use std::collections::HashMap;
use validator::Validate;

use crate::{dto::*, error::{ApiError, ApiResult}, AppState};

async fn load(state: &AppState, id: &EvalId) -> ApiResult<Eval> {
    state
        .stores
        .evals
        .get_eval(id)
        .await?
        .ok_or_else(|| CoreError::not_found("eval", id).into())
}

pub async fn generate(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerateEvalsRequest>,
) -> ApiResult<(StatusCode, Json<BatchResponse<Eval>>)> {
    payload.validate()?;

    let report = state.generator.generate(&payload.into()).await?;

    Ok((StatusCode::CREATED, Json(BatchResponse::from(report))))
}

pub async fn list(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ListEvalsRequest>,
) -> ApiResult<Json<Vec<EvalResponse>>> {
    payload.validate()?;

    let evals = state.stores.evals.list_evals(&payload.filter).await?;

    let creators: HashMap<ModelId, ModelResponse> = if payload.include_creator {
        state
            .stores
            .models
            .list_models()
            .await?
            .into_iter()
            .map(|m| (m.id, ModelResponse::from(m)))
            .collect()
    } else {
        HashMap::new()
    };

    let mut response = Vec::with_capacity(evals.len());
    for eval in evals {
        let results = if payload.include_results {
            Some(
                state
                    .stores
                    .results
                    .list_results(&ResultFilter::for_eval(eval.id))
                    .await?,
            )
        } else {
            None
        };
        let judgments = if payload.include_judgments {
            Some(
                state
                    .stores
                    .judgments
                    .list_judgments(&JudgmentFilter::for_eval(eval.id))
                    .await?,
            )
        } else {
            None
        };

        response.push(EvalResponse {
            creator: creators.get(&eval.creator_model_id).cloned(),
            results,
            judgments,
            eval,
        });
    }

    Ok(Json(response))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<EvalId>,
) -> ApiResult<Json<EvalResponse>> {
    let eval = load(&state, &id).await?;

    let creator = state
        .stores
        .models
        .get_model(&eval.creator_model_id)
        .await?
        .map(ModelResponse::from);
    let results = state
        .stores
        .results
        .list_results(&ResultFilter::for_eval(id))
        .await?;
    let judgments = state
        .stores
        .judgments
        .list_judgments(&JudgmentFilter::for_eval(id))
        .await?;

    Ok(Json(EvalResponse {
        eval,
        creator,
        results: Some(results),
        judgments: Some(judgments),
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<EvalId>,
    ApiJson(payload): ApiJson<UpdateEvalRequest>,
) -> ApiResult<Json<EvalResponse>> {
    payload.validate()?;

    let mut eval = load(&state, &id).await?;
    eval.apply(payload.into());
    let eval = state.stores.evals.update_eval(&eval).await?;

    Ok(Json(EvalResponse::from(eval)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<EvalId>,
) -> ApiResult<StatusCode> {
    if state.stores.evals.delete_eval(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("eval {} not found", id)))
    }
}
