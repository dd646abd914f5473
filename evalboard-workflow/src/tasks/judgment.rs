use evalboard_core::{
    CoreError, Eval, EvalId, Judgment, Model, ModelId, RatingScale, Result, ResultFilter,
    RunResult,
};
use evalboard_storage::Stores;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::{extract_json, require_model, UnitError, WorkflowSettings};
use crate::executor::{BatchExecutor, BatchReport, UnitOutcome};
use crate::provider::{ChatMessage, ChatProvider, ChatRequest};

#[derive(Debug, Clone)]
pub struct JudgeRequest {
    pub eval_ids: Vec<EvalId>,
    pub judge_model_id: ModelId,
    pub rating_scale: RatingScale,
}

#[derive(Debug, Deserialize)]
struct Verdict {
    score: f64,
    #[serde(alias = "justificationText")]
    justification: String,
}

fn judge_instruction(scale: &RatingScale) -> String {
    format!(
        "You are an impartial judge of answers to an evaluation question. \
         Score the quality of the responses on a scale from {} (worst) to {} (best). \
         Reply with a single JSON object and nothing else: \
         {{\"score\": number, \"justification\": string}}",
        scale.min, scale.max
    )
}

fn judge_prompt(eval: &Eval, results: &[RunResult]) -> String {
    let mut prompt = format!("Question:\n{}\n", eval.question_text);
    if let Some(format) = eval.metadata.expected_format() {
        prompt.push_str(&format!("\nExpected format:\n{format}\n"));
    }
    if let Some(answer) = eval.metadata.example_answer().filter(|a| !a.is_empty()) {
        prompt.push_str(&format!("\nExample answer:\n{answer}\n"));
    }

    prompt.push_str("\nResponses:\n");
    if results.is_empty() {
        prompt.push_str("(no responses recorded)\n");
    }
    for (i, result) in results.iter().enumerate() {
        match (&result.response_text, &result.error_log) {
            (Some(text), _) => {
                prompt.push_str(&format!("{}. {}\n", i + 1, text));
            }
            (None, Some(error)) => {
                prompt.push_str(&format!("{}. (no response; run failed: {})\n", i + 1, error));
            }
            (None, None) => {
                prompt.push_str(&format!("{}. (empty response)\n", i + 1));
            }
        }
    }
    prompt
}

fn parse_verdict(reply: &str, scale: &RatingScale) -> std::result::Result<(f64, String), UnitError> {
    let verdict: Verdict = serde_json::from_str(extract_json(reply))?;
    let score = scale
        .normalize(verdict.score)
        .map_err(|e| UnitError::Invalid(e.to_string()))?;
    Ok((score, verdict.justification))
}

/// Has a judge model score evals from their recorded results.
pub struct EvalJudge {
    stores: Stores,
    provider: Arc<dyn ChatProvider>,
    executor: BatchExecutor,
    temperature: f32,
    max_tokens: u32,
}

impl EvalJudge {
    pub fn new(stores: Stores, provider: Arc<dyn ChatProvider>, settings: &WorkflowSettings) -> Self {
        Self {
            stores,
            provider,
            executor: BatchExecutor::new(settings.max_concurrency),
            temperature: settings.judge_temperature,
            max_tokens: settings.judge_max_tokens,
        }
    }

    /// One judgment per eval. A unit whose judge call or verdict fails
    /// persists nothing and is reported as failed.
    pub async fn judge(&self, request: &JudgeRequest) -> Result<BatchReport<Judgment>> {
        if request.eval_ids.is_empty() {
            return Err(CoreError::Validation(
                "at least one eval id is required".to_string(),
            ));
        }
        request.rating_scale.check()?;

        let judge = require_model(self.stores.models.as_ref(), &request.judge_model_id).await?;
        let mut evals = Vec::with_capacity(request.eval_ids.len());
        for id in &request.eval_ids {
            let eval = self
                .stores
                .evals
                .get_eval(id)
                .await?
                .ok_or_else(|| CoreError::not_found("eval", id))?;
            evals.push(eval);
        }

        let units: Vec<_> = evals
            .iter()
            .map(|eval| self.judge_one(eval, &judge, &request.rating_scale))
            .collect();

        let outcomes = self
            .executor
            .execute(units)
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        let report = BatchReport::new(outcomes);

        info!(
            judge = %judge.name,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Judging finished"
        );

        Ok(report)
    }

    async fn judge_one(
        &self,
        eval: &Eval,
        judge: &Model,
        scale: &RatingScale,
    ) -> Result<UnitOutcome<Judgment>> {
        let results = self
            .stores
            .results
            .list_results(&ResultFilter::for_eval(eval.id))
            .await?;

        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(judge_instruction(scale)),
                ChatMessage::user(judge_prompt(eval, &results)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let verdict = match self.provider.complete(judge, &request).await {
            Ok(reply) => parse_verdict(&reply, scale),
            Err(e) => Err(UnitError::from(e)),
        };

        match verdict {
            Ok((score, justification)) => {
                let judgment = Judgment::new(eval.id, judge.id, score, justification);
                let row = self.stores.judgments.create_judgment(&judgment).await?;
                Ok(UnitOutcome::Succeeded { row })
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(eval = %eval.id, judge = %judge.name, error = %reason, "Judging unit failed");
                Ok(UnitOutcome::Failed { reason, row: None })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockChatProvider, ProviderError};
    use evalboard_core::{Difficulty, GeneratedMetadata, GenerationParams, JudgmentFilter};
    use pretty_assertions::assert_eq;

    fn model(name: &str) -> Model {
        Model::new(
            name.to_string(),
            format!("{name}-id"),
            "https://api.example.com/v1".to_string(),
            "sk-test-key-123".to_string(),
        )
    }

    fn eval(creator: ModelId, question: &str) -> Eval {
        Eval::generated(
            creator,
            question.to_string(),
            &[],
            Difficulty::Easy,
            GeneratedMetadata {
                expected_format: "integer".to_string(),
                example_answer: "4".to_string(),
                validation_criteria: vec!["correct".to_string()],
                skills_tested: vec!["arithmetic".to_string()],
                estimated_time_minutes: 1,
                generation_params: GenerationParams {
                    prompt: "math".to_string(),
                    temperature: 0.7,
                    max_tokens: 100,
                    question_number: 1,
                    number_of_questions: 1,
                },
            },
        )
    }

    async fn seed(stores: &Stores) -> (Model, Eval, Eval) {
        let judge = model("judge");
        stores.models.create_model(&judge).await.unwrap();
        let first = eval(judge.id, "What is 2 + 2?");
        let second = eval(judge.id, "What is 3 + 3?");
        stores.evals.create_eval(&first).await.unwrap();
        stores.evals.create_eval(&second).await.unwrap();
        stores
            .results
            .create_result(&RunResult::success(first.id, judge.id, "4".to_string()))
            .await
            .unwrap();
        (judge, first, second)
    }

    #[test]
    fn prompt_includes_question_format_and_responses() {
        let e = eval(ModelId::new(), "What is 2 + 2?");
        let results = vec![
            RunResult::success(e.id, ModelId::new(), "four".to_string()),
            RunResult::failure(e.id, ModelId::new(), "HTTP 500".to_string()),
        ];
        let prompt = judge_prompt(&e, &results);
        assert!(prompt.contains("What is 2 + 2?"));
        assert!(prompt.contains("Expected format:\ninteger"));
        assert!(prompt.contains("1. four"));
        assert!(prompt.contains("run failed: HTTP 500"));
    }

    #[test]
    fn prompt_renders_every_section_line_by_line() {
        let e = eval(ModelId::new(), "What is 2 + 2?");
        let mut empty = RunResult::success(e.id, ModelId::new(), String::new());
        empty.response_text = None;
        let results = vec![
            RunResult::success(e.id, ModelId::new(), "four".to_string()),
            RunResult::failure(e.id, ModelId::new(), "HTTP 500".to_string()),
            empty,
        ];
        let prompt = judge_prompt(&e, &results);
        assert_eq!(
            prompt,
            "Question:\nWhat is 2 + 2?\n\
             \nExpected format:\ninteger\n\
             \nExample answer:\n4\n\
             \nResponses:\n\
             1. four\n\
             2. (no response; run failed: HTTP 500)\n\
             3. (empty response)\n"
        );
    }

    #[test]
    fn prompt_without_results_says_so() {
        let e = eval(ModelId::new(), "What is 2 + 2?");
        assert!(judge_prompt(&e, &[]).ends_with("\nResponses:\n(no responses recorded)\n"));
    }

    #[test]
    fn verdict_is_normalized_onto_the_scale() {
        let scale = RatingScale::new(1.0, 10.0).unwrap();
        let (score, why) =
            parse_verdict(r#"{"score": 10, "justification": "perfect"}"#, &scale).unwrap();
        assert_eq!(score, 1.0);
        assert_eq!(why, "perfect");

        assert!(parse_verdict(r#"{"score": 11, "justification": "?"}"#, &scale).is_err());
    }

    #[tokio::test]
    async fn judges_each_eval_once() {
        let stores = Stores::memory();
        let (judge, first, second) = seed(&stores).await;
        let mut provider = MockChatProvider::new();
        provider
            .expect_complete()
            .times(2)
            .returning(|_, _| Ok(r#"{"score": 0.8, "justification": "good"}"#.to_string()));
        let judge_task = EvalJudge::new(stores.clone(), Arc::new(provider), &WorkflowSettings::default());

        let report = judge_task
            .judge(&JudgeRequest {
                eval_ids: vec![first.id, second.id],
                judge_model_id: judge.id,
                rating_scale: RatingScale::default(),
            })
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 2);
        let stored = stores.judgments.list_judgments(&JudgmentFilter::default()).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|j| (j.score - 0.8).abs() < 1e-9));
    }

    #[tokio::test]
    async fn failed_judge_call_persists_nothing() {
        let stores = Stores::memory();
        let (judge, first, second) = seed(&stores).await;
        let mut provider = MockChatProvider::new();
        provider.expect_complete().returning(|_, request| {
            if request.messages[1].content.contains("3 + 3") {
                Err(ProviderError::EmptyContent)
            } else {
                Ok("```json\n{\"score\": 1, \"justification\": \"right\"}\n```".to_string())
            }
        });
        let judge_task = EvalJudge::new(stores.clone(), Arc::new(provider), &WorkflowSettings::default());

        let report = judge_task
            .judge(&JudgeRequest {
                eval_ids: vec![first.id, second.id],
                judge_model_id: judge.id,
                rating_scale: RatingScale::default(),
            })
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.outcomes[1].row().is_none());
        let stored = stores.judgments.list_judgments(&JudgmentFilter::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].eval_id, first.id);
    }

    #[tokio::test]
    async fn inverted_scale_is_rejected() {
        let stores = Stores::memory();
        let (judge, first, _) = seed(&stores).await;
        let judge_task = EvalJudge::new(
            stores,
            Arc::new(MockChatProvider::new()),
            &WorkflowSettings::default(),
        );

        let err = judge_task
            .judge(&JudgeRequest {
                eval_ids: vec![first.id],
                judge_model_id: judge.id,
                rating_scale: RatingScale { min: 5.0, max: 1.0 },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
