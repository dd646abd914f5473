use evalboard_core::{Difficulty, Eval, EvalFilter, EvalUpdate, Judgment, ModelId, RunResult};
use evalboard_workflow::GenerationRequest;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::ModelResponse;

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_number_of_questions() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEvalsRequest {
    pub prompt: String,
    #[validate(length(min = 1, message = "at least one model id is required"))]
    pub model_ids: Vec<ModelId>,
    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 100, max = 4000))]
    pub max_tokens: u32,
    #[serde(default = "default_number_of_questions")]
    #[validate(range(min = 1, max = 10))]
    pub number_of_questions: u32,
}

impl From<GenerateEvalsRequest> for GenerationRequest {
    fn from(req: GenerateEvalsRequest) -> Self {
        GenerationRequest {
            prompt: req.prompt,
            model_ids: req.model_ids,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            number_of_questions: req.number_of_questions,
        }
    }
}

fn validate_time_range(filter: &EvalFilter) -> Result<(), ValidationError> {
    match filter.estimated_time_range {
        Some(range) if matches!((range.min, range.max), (Some(min), Some(max)) if min > max) => {
            Err(ValidationError::new("estimated_time_range_inverted"))
        }
        _ => Ok(()),
    }
}

/// Body of `POST /evals/query`.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListEvalsRequest {
    #[serde(flatten)]
    #[validate(custom(function = "validate_time_range"))]
    pub filter: EvalFilter,
    #[serde(default)]
    pub include_creator: bool,
    #[serde(default)]
    pub include_results: bool,
    #[serde(default)]
    pub include_judgments: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvalRequest {
    #[validate(length(min = 1))]
    pub question_text: Option<String>,
    pub tags: Option<String>,
    pub difficulty: Option<Difficulty>,
}

impl From<UpdateEvalRequest> for EvalUpdate {
    fn from(req: UpdateEvalRequest) -> Self {
        EvalUpdate {
            question_text: req.question_text,
            tags: req.tags,
            difficulty: req.difficulty,
        }
    }
}

/// An eval with whichever relations were requested.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalResponse {
    #[serde(flatten)]
    pub eval: Eval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<ModelResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RunResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judgments: Option<Vec<Judgment>>,
}

impl From<Eval> for EvalResponse {
    fn from(eval: Eval) -> Self {
        Self {
            eval,
            creator: None,
            results: None,
            judgments: None,
        }
    }
}
