use evalboard_core::{CoreError, Eval, EvalId, Model, ModelId, Result, RunResult};
use evalboard_storage::Stores;
use std::sync::Arc;
use tracing::{info, warn};

use super::{require_model, WorkflowSettings};
use crate::executor::{BatchExecutor, BatchReport, UnitOutcome};
use crate::provider::{ChatMessage, ChatProvider, ChatRequest};

/// Runs evals against target models and records what came back.
pub struct EvalRunner {
    stores: Stores,
    provider: Arc<dyn ChatProvider>,
    executor: BatchExecutor,
    temperature: f32,
    max_tokens: u32,
}

fn answer_instruction(eval: &Eval) -> String {
    let mut instruction =
        "Answer the following question as accurately as you can.".to_string();
    if let Some(format) = eval.metadata.expected_format() {
        instruction.push_str(&format!(" Format your answer as: {format}."));
    }
    instruction
}

impl EvalRunner {
    pub fn new(stores: Stores, provider: Arc<dyn ChatProvider>, settings: &WorkflowSettings) -> Self {
        Self {
            stores,
            provider,
            executor: BatchExecutor::new(settings.max_concurrency),
            temperature: settings.run_temperature,
            max_tokens: settings.run_max_tokens,
        }
    }

    /// One attempt. A model failure is stored in the result's error log and
    /// still returns the row.
    pub async fn run(&self, eval_id: &EvalId, model_id: &ModelId) -> Result<RunResult> {
        let eval = self.require_eval(eval_id).await?;
        let model = require_model(self.stores.models.as_ref(), model_id).await?;
        self.run_resolved(&eval, &model).await
    }

    /// Every eval against every model.
    pub async fn run_batch(
        &self,
        eval_ids: &[EvalId],
        model_ids: &[ModelId],
    ) -> Result<BatchReport<RunResult>> {
        if eval_ids.is_empty() || model_ids.is_empty() {
            return Err(CoreError::Validation(
                "at least one eval id and one model id are required".to_string(),
            ));
        }

        let mut evals = Vec::with_capacity(eval_ids.len());
        for id in eval_ids {
            evals.push(self.require_eval(id).await?);
        }
        let mut models = Vec::with_capacity(model_ids.len());
        for id in model_ids {
            models.push(require_model(self.stores.models.as_ref(), id).await?);
        }

        let units: Vec<_> = evals
            .iter()
            .flat_map(|eval| models.iter().map(move |model| self.run_unit(eval, model)))
            .collect();

        let outcomes = self
            .executor
            .execute(units)
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        let report = BatchReport::new(outcomes);

        info!(
            evals = evals.len(),
            models = models.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch run finished"
        );

        Ok(report)
    }

    async fn run_unit(&self, eval: &Eval, model: &Model) -> Result<UnitOutcome<RunResult>> {
        let row = self.run_resolved(eval, model).await?;
        Ok(match row.error_log.clone().filter(|log| !log.is_empty()) {
            Some(reason) => UnitOutcome::Failed {
                reason,
                row: Some(row),
            },
            None => UnitOutcome::Succeeded { row },
        })
    }

    async fn run_resolved(&self, eval: &Eval, model: &Model) -> Result<RunResult> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(answer_instruction(eval)),
                ChatMessage::user(eval.question_text.clone()),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let result = match self.provider.complete(model, &request).await {
            Ok(text) => RunResult::success(eval.id, model.id, text),
            Err(e) => {
                warn!(eval = %eval.id, model = %model.name, error = %e, "Eval run failed");
                RunResult::failure(eval.id, model.id, e.to_string())
            }
        };

        self.stores.results.create_result(&result).await
    }

    async fn require_eval(&self, id: &EvalId) -> Result<Eval> {
        self.stores
            .evals
            .get_eval(id)
            .await?
            .ok_or_else(|| CoreError::not_found("eval", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockChatProvider, ProviderError};
    use evalboard_core::{Difficulty, GeneratedMetadata, GenerationParams, ResultFilter};
    use pretty_assertions::assert_eq;

    async fn seed(stores: &Stores) -> (Eval, Model) {
        let model = Model::new(
            "target".to_string(),
            "gpt-test".to_string(),
            "https://api.example.com/v1".to_string(),
            "sk-test-key-123".to_string(),
        );
        stores.models.create_model(&model).await.unwrap();
        let eval = Eval::generated(
            model.id,
            "What is 2 + 2?".to_string(),
            &["math".to_string()],
            Difficulty::Easy,
            GeneratedMetadata {
                expected_format: "a single integer".to_string(),
                example_answer: "4".to_string(),
                validation_criteria: vec!["equals 4".to_string()],
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
        );
        stores.evals.create_eval(&eval).await.unwrap();
        (eval, model)
    }

    #[test]
    fn instruction_mentions_expected_format() {
        let eval = Eval::failed(ModelId::new(), "x".to_string(), GenerationParams {
            prompt: String::new(),
            temperature: 0.0,
            max_tokens: 100,
            question_number: 1,
            number_of_questions: 1,
        });
        assert!(!answer_instruction(&eval).contains("Format"));
    }

    #[tokio::test]
    async fn successful_run_stores_response() {
        let stores = Stores::memory();
        let (eval, model) = seed(&stores).await;
        let mut provider = MockChatProvider::new();
        provider
            .expect_complete()
            .withf(|_, request| request.messages[0].content.contains("a single integer"))
            .returning(|_, _| Ok("4".to_string()));
        let runner = EvalRunner::new(stores.clone(), Arc::new(provider), &WorkflowSettings::default());

        let result = runner.run(&eval.id, &model.id).await.unwrap();

        assert_eq!(result.response_text.as_deref(), Some("4"));
        assert!(result.error_log.is_none());
    }

    #[tokio::test]
    async fn failed_call_is_recorded_in_error_log() {
        let stores = Stores::memory();
        let (eval, model) = seed(&stores).await;
        let mut provider = MockChatProvider::new();
        provider
            .expect_complete()
            .returning(|_, _| Err(ProviderError::EmptyContent));
        let runner = EvalRunner::new(stores.clone(), Arc::new(provider), &WorkflowSettings::default());

        let result = runner.run(&eval.id, &model.id).await.unwrap();

        assert!(result.is_failure());
        assert!(result.response_text.is_none());
        let stats = stores.results.model_stats(&model.id).await.unwrap();
        assert_eq!(stats.failed_runs, 1);
    }

    #[tokio::test]
    async fn running_twice_creates_two_rows() {
        let stores = Stores::memory();
        let (eval, model) = seed(&stores).await;
        let mut provider = MockChatProvider::new();
        provider.expect_complete().times(2).returning(|_, _| Ok("4".to_string()));
        let runner = EvalRunner::new(stores.clone(), Arc::new(provider), &WorkflowSettings::default());

        runner.run(&eval.id, &model.id).await.unwrap();
        runner.run(&eval.id, &model.id).await.unwrap();

        let rows = stores
            .results
            .list_results(&ResultFilter::for_eval(eval.id))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn unknown_eval_is_not_found() {
        let stores = Stores::memory();
        let (_eval, model) = seed(&stores).await;
        let runner = EvalRunner::new(
            stores,
            Arc::new(MockChatProvider::new()),
            &WorkflowSettings::default(),
        );

        let err = runner.run(&EvalId::new(), &model.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn batch_covers_every_pair() {
        let stores = Stores::memory();
        let (eval, model) = seed(&stores).await;
        let other = Model::new(
            "other".to_string(),
            "gpt-other".to_string(),
            "https://api.example.com/v1".to_string(),
            "sk-other-key-456".to_string(),
        );
        stores.models.create_model(&other).await.unwrap();

        let mut provider = MockChatProvider::new();
        provider.expect_complete().returning(|model, _| {
            if model.name == "other" {
                Err(ProviderError::EmptyContent)
            } else {
                Ok("4".to_string())
            }
        });
        let runner = EvalRunner::new(stores.clone(), Arc::new(provider), &WorkflowSettings::default());

        let report = runner.run_batch(&[eval.id], &[model.id, other.id]).await.unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.rows().len(), 2);
    }
}
