use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use evalboard_core::{CoreError, Judgment, JudgmentId};
use evalboard_metrics::{LeaderboardAggregator, LeaderboardEntry};
use validator::Validate;

use crate::{dto::*, error::{ApiError, ApiResult}, AppState};

async fn load(state: &AppState, id: &JudgmentId) -> ApiResult<Judgment> {
    state
        .stores
        .judgments
        .get_judgment(id)
        .await?
        .ok_or_else(|| CoreError::not_found("judgment", id).into())
}

async fn with_relations(
    state: &AppState,
    judgment: Judgment,
    include_eval: bool,
    include_judge_model: bool,
) -> ApiResult<JudgmentResponse> {
    let eval = if include_eval {
        state.stores.evals.get_eval(&judgment.eval_id).await?
    } else {
        None
    };
    let judge_model = if include_judge_model {
        state
            .stores
            .models
            .get_model(&judgment.judge_model_id)
            .await?
            .map(ModelResponse::from)
    } else {
        None
    };

    Ok(JudgmentResponse {
        judgment,
        eval,
        judge_model,
    })
}

pub async fn judge(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<JudgeEvalsRequest>,
) -> ApiResult<(StatusCode, Json<BatchResponse<Judgment>>)> {
    payload.validate()?;

    let report = state.judge.judge(&payload.into()).await?;

    Ok((StatusCode::CREATED, Json(BatchResponse::from(report))))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListJudgmentsQuery>,
) -> ApiResult<Json<Vec<JudgmentResponse>>> {
    let judgments = state.stores.judgments.list_judgments(&query.filter()).await?;

    let mut response = Vec::with_capacity(judgments.len());
    for judgment in judgments {
        response.push(
            with_relations(&state, judgment, query.include_eval, query.include_judge_model).await?,
        );
    }

    Ok(Json(response))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<JudgmentId>,
) -> ApiResult<Json<JudgmentResponse>> {
    let judgment = load(&state, &id).await?;
    Ok(Json(with_relations(&state, judgment, true, true).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<JudgmentId>,
    ApiJson(payload): ApiJson<UpdateJudgmentRequest>,
) -> ApiResult<Json<Judgment>> {
    let mut judgment = load(&state, &id).await?;
    judgment.apply(payload.into());
    Ok(Json(state.stores.judgments.update_judgment(&judgment).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<JudgmentId>,
) -> ApiResult<StatusCode> {
    if state.stores.judgments.delete_judgment(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("judgment {} not found", id)))
    }
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let totals = state.stores.judgments.leaderboard_totals().await?;
    Ok(Json(LeaderboardAggregator::build(totals, query.ranked)))
}
