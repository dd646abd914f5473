use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{error::ApiResult, AppState};

pub async fn check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.stores.health.check().await?;
    Ok(Json(json!({ "status": "ok" })))
}
