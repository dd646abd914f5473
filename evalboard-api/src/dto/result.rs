use evalboard_core::{Eval, EvalId, ModelId, ResultFilter, ResultUpdate, RunResult};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::ModelResponse;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvalRequest {
    pub eval_id: EvalId,
    pub model_id: ModelId,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RunEvalsRequest {
    #[validate(length(min = 1))]
    pub eval_ids: Vec<EvalId>,
    #[validate(length(min = 1))]
    pub model_ids: Vec<ModelId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResultsQuery {
    pub eval_id: Option<EvalId>,
    pub model_id: Option<ModelId>,
    #[serde(default)]
    pub include_eval: bool,
    #[serde(default)]
    pub include_model: bool,
}

impl ListResultsQuery {
    pub fn filter(&self) -> ResultFilter {
        ResultFilter {
            eval_id: self.eval_id,
            model_id: self.model_id,
        }
    }
}

fn validate_single_outcome(req: &UpdateResultRequest) -> Result<(), ValidationError> {
    if req.response_text.is_some() && req.error_log.is_some() {
        return Err(ValidationError::new("response_text_and_error_log_are_exclusive"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_single_outcome"))]
pub struct UpdateResultRequest {
    pub response_text: Option<String>,
    pub error_log: Option<String>,
}

impl From<UpdateResultRequest> for ResultUpdate {
    fn from(req: UpdateResultRequest) -> Self {
        ResultUpdate {
            response_text: req.response_text,
            error_log: req.error_log,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    #[serde(flatten)]
    pub result: RunResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval: Option<Eval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelResponse>,
}
