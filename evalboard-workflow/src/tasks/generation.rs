use evalboard_core::{
    CoreError, Difficulty, Eval, GeneratedMetadata, GenerationParams, Model, ModelId, Result,
};
use evalboard_storage::Stores;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use super::{extract_json, require_model, UnitError, WorkflowSettings};
use crate::executor::{BatchExecutor, BatchReport, UnitOutcome};
use crate::provider::{ChatMessage, ChatProvider, ChatRequest};

const GENERATION_INSTRUCTION: &str = r#"You write evaluation questions for large language models.
Reply with a single JSON object and nothing else, using exactly these fields:
{
  "questionText": string,
  "tags": string[],
  "difficulty": "easy" | "medium" | "hard",
  "expectedFormat": string,
  "exampleAnswer": string,
  "validationCriteria": string[],
  "skillsTested": string[],
  "estimatedTimeMinutes": integer
}"#;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model_ids: Vec<ModelId>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub number_of_questions: u32,
}

/// Shape a creator model must return.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct GeneratedQuestion {
    #[validate(length(min = 1))]
    question_text: String,
    #[serde(default)]
    tags: Vec<String>,
    difficulty: String,
    #[validate(length(min = 1))]
    expected_format: String,
    #[serde(default)]
    example_answer: String,
    #[validate(length(min = 1))]
    validation_criteria: Vec<String>,
    #[validate(length(min = 1))]
    skills_tested: Vec<String>,
    estimated_time_minutes: u32,
}

/// Accepts `easy`, `medium` or `hard` in any case.
fn parse_generated_difficulty(raw: &str) -> std::result::Result<Difficulty, UnitError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "easy" => Ok(Difficulty::Easy),
        "medium" => Ok(Difficulty::Medium),
        "hard" => Ok(Difficulty::Hard),
        other => Err(UnitError::Invalid(format!(
            "difficulty must be easy, medium or hard, got {other:?}"
        ))),
    }
}

fn parse_question(reply: &str) -> std::result::Result<(GeneratedQuestion, Difficulty), UnitError> {
    let question: GeneratedQuestion = serde_json::from_str(extract_json(reply))?;
    question.validate()?;
    let difficulty = parse_generated_difficulty(&question.difficulty)?;
    Ok((question, difficulty))
}

pub struct EvalGenerator {
    stores: Stores,
    provider: Arc<dyn ChatProvider>,
    executor: BatchExecutor,
}

impl EvalGenerator {
    pub fn new(stores: Stores, provider: Arc<dyn ChatProvider>, settings: &WorkflowSettings) -> Self {
        Self {
            stores,
            provider,
            executor: BatchExecutor::new(settings.max_concurrency),
        }
    }

    /// Produces `numberOfQuestions` evals per model. Units that fail at the
    /// model persist an error-tagged eval instead; only store failures or
    /// unknown models fail the whole call.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<BatchReport<Eval>> {
        if request.model_ids.is_empty() {
            return Err(CoreError::Validation(
                "at least one model id is required".to_string(),
            ));
        }

        let mut models = Vec::with_capacity(request.model_ids.len());
        for id in &request.model_ids {
            models.push(require_model(self.stores.models.as_ref(), id).await?);
        }

        let total = request.number_of_questions;
        let units: Vec<_> = models
            .iter()
            .flat_map(|model| {
                (1..=total).map(move |number| {
                    let params = GenerationParams {
                        prompt: request.prompt.clone(),
                        temperature: request.temperature,
                        max_tokens: request.max_tokens,
                        question_number: number,
                        number_of_questions: total,
                    };
                    self.generate_one(model, params)
                })
            })
            .collect();

        let outcomes = self
            .executor
            .execute(units)
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        let report = BatchReport::new(outcomes);

        info!(
            models = models.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Eval generation finished"
        );

        Ok(report)
    }

    async fn generate_one(&self, model: &Model, params: GenerationParams) -> Result<UnitOutcome<Eval>> {
        match self.ask(model, &params).await {
            Ok((question, difficulty)) => {
                let eval = Eval::generated(
                    model.id,
                    question.question_text,
                    &question.tags,
                    difficulty,
                    GeneratedMetadata {
                        expected_format: question.expected_format,
                        example_answer: question.example_answer,
                        validation_criteria: question.validation_criteria,
                        skills_tested: question.skills_tested,
                        estimated_time_minutes: question.estimated_time_minutes,
                        generation_params: params,
                    },
                );
                let row = self.stores.evals.create_eval(&eval).await?;
                Ok(UnitOutcome::Succeeded { row })
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    model = %model.name,
                    question = params.question_number,
                    error = %reason,
                    "Eval generation unit failed"
                );
                let eval = Eval::failed(model.id, reason.clone(), params);
                let row = self.stores.evals.create_eval(&eval).await?;
                Ok(UnitOutcome::Failed {
                    reason,
                    row: Some(row),
                })
            }
        }
    }

    async fn ask(
        &self,
        model: &Model,
        params: &GenerationParams,
    ) -> std::result::Result<(GeneratedQuestion, Difficulty), UnitError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(GENERATION_INSTRUCTION),
                ChatMessage::user(format!(
                    "{}\n\nThis is question {} of {}; make it distinct from the others.",
                    params.prompt, params.question_number, params.number_of_questions
                )),
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let reply = self.provider.complete(model, &request).await?;
        parse_question(&reply)
    }
}
