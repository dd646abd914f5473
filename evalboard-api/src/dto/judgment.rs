use evalboard_core::{Eval, EvalId, Judgment, JudgmentFilter, JudgmentUpdate, ModelId, RatingScale};
use evalboard_workflow::JudgeRequest;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ModelResponse;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JudgeEvalsRequest {
    #[validate(length(min = 1))]
    pub eval_ids: Vec<EvalId>,
    pub judge_model_id: ModelId,
    /// Scale the judge scores on; defaults to 0..1.
    pub rating_scale: Option<RatingScale>,
}

impl From<JudgeEvalsRequest> for JudgeRequest {
    fn from(req: JudgeEvalsRequest) -> Self {
        JudgeRequest {
            eval_ids: req.eval_ids,
            judge_model_id: req.judge_model_id,
            rating_scale: req.rating_scale.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJudgmentsQuery {
    pub eval_id: Option<EvalId>,
    pub judge_model_id: Option<ModelId>,
    #[serde(default)]
    pub include_eval: bool,
    #[serde(default)]
    pub include_judge_model: bool,
}

impl ListJudgmentsQuery {
    pub fn filter(&self) -> JudgmentFilter {
        JudgmentFilter {
            eval_id: self.eval_id,
            judge_model_id: self.judge_model_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJudgmentRequest {
    pub score: Option<f64>,
    pub justification_text: Option<String>,
}

impl From<UpdateJudgmentRequest> for JudgmentUpdate {
    fn from(req: UpdateJudgmentRequest) -> Self {
        JudgmentUpdate {
            score: req.score,
            justification_text: req.justification_text,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentResponse {
    #[serde(flatten)]
    pub judgment: Judgment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval: Option<Eval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge_model: Option<ModelResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub ranked: bool,
}
