pub mod generation;
pub mod judgment;
pub mod run;

pub use generation::*;
pub use judgment::*;
pub use run::*;

use crate::provider::ProviderError;
use evalboard_core::{CoreError, Model, ModelId, ModelStore, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_max_concurrency() -> usize {
    8
}

fn default_run_temperature() -> f32 {
    0.7
}

fn default_run_max_tokens() -> u32 {
    1000
}

fn default_judge_temperature() -> f32 {
    0.0
}

fn default_judge_max_tokens() -> u32 {
    1000
}

/// Sampling and fan-out settings shared by the generation, run and judgment
/// tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSettings {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_run_temperature")]
    pub run_temperature: f32,
    #[serde(default = "default_run_max_tokens")]
    pub run_max_tokens: u32,
    #[serde(default = "default_judge_temperature")]
    pub judge_temperature: f32,
    #[serde(default = "default_judge_max_tokens")]
    pub judge_max_tokens: u32,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            run_temperature: default_run_temperature(),
            run_max_tokens: default_run_max_tokens(),
            judge_temperature: default_judge_temperature(),
            judge_max_tokens: default_judge_max_tokens(),
        }
    }
}

/// Why a single unit of work failed. Never escapes a batch; it is recorded
/// on the unit's outcome.
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("model call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("model returned invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model output rejected: {0}")]
    Invalid(String),
}

impl From<validator::ValidationErrors> for UnitError {
    fn from(errors: validator::ValidationErrors) -> Self {
        UnitError::Invalid(errors.to_string())
    }
}

/// Returns the JSON object embedded in a model reply. A fenced block
/// (```json ... ``` or ``` ... ```) wins; otherwise the span from the first
/// `{` to the last `}`; otherwise the trimmed text.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let body = after_fence
            .strip_prefix("json")
            .or_else(|| after_fence.strip_prefix("JSON"))
            .unwrap_or(after_fence);
        let body = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
        return body.trim();
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

pub(crate) async fn require_model(models: &dyn ModelStore, id: &ModelId) -> Result<Model> {
    models
        .get_model(id)
        .await?
        .ok_or_else(|| CoreError::not_found("model", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{\"a\":1}", "{\"a\":1}")]
    #[case("```json\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case("Here you go:\n```\n{\"a\":1}\n```\nthanks", "{\"a\":1}")]
    #[case("Sure! {\"a\":{\"b\":2}} hope that helps", "{\"a\":{\"b\":2}}")]
    #[case("  no json here ", "no json here")]
    fn extract_json_finds_the_object(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(extract_json(input), expected);
    }
}
