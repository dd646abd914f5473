use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{EvalId, ModelId};
use crate::error::CoreError;

/// Tag written on evals whose generation failed.
pub const ERROR_TAG: &str = "error";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[default]
    Unknown,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CoreError;

    /// Exact, case-sensitive parse of the stored form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "unknown" => Ok(Difficulty::Unknown),
            other => Err(CoreError::Validation(format!("unknown difficulty: {other}"))),
        }
    }
}

/// Sampling parameters and prompt that produced an eval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 1-based position of this question within its batch.
    pub question_number: u32,
    pub number_of_questions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMetadata {
    pub expected_format: String,
    pub example_answer: String,
    pub validation_criteria: Vec<String>,
    pub skills_tested: Vec<String>,
    pub estimated_time_minutes: u32,
    pub generation_params: GenerationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedMetadata {
    pub error: String,
    pub generation_params: GenerationParams,
}

/// Structured metadata attached to every eval. Stored as a JSON document
/// whose `kind` field discriminates the variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EvalMetadata {
    Generated(GeneratedMetadata),
    Failed(FailedMetadata),
}

impl EvalMetadata {
    pub fn is_failed(&self) -> bool {
        matches!(self, EvalMetadata::Failed(_))
    }

    pub fn skills_tested(&self) -> Option<&[String]> {
        match self {
            EvalMetadata::Generated(meta) => Some(&meta.skills_tested),
            EvalMetadata::Failed(_) => None,
        }
    }

    pub fn estimated_time_minutes(&self) -> Option<u32> {
        match self {
            EvalMetadata::Generated(meta) => Some(meta.estimated_time_minutes),
            EvalMetadata::Failed(_) => None,
        }
    }

    pub fn expected_format(&self) -> Option<&str> {
        match self {
            EvalMetadata::Generated(meta) => Some(&meta.expected_format),
            EvalMetadata::Failed(_) => None,
        }
    }

    pub fn example_answer(&self) -> Option<&str> {
        match self {
            EvalMetadata::Generated(meta) => Some(&meta.example_answer),
            EvalMetadata::Failed(_) => None,
        }
    }

    pub fn generation_params(&self) -> &GenerationParams {
        match self {
            EvalMetadata::Generated(meta) => &meta.generation_params,
            EvalMetadata::Failed(meta) => &meta.generation_params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Eval {
    pub id: EvalId,
    pub question_text: String,
    pub creator_model_id: ModelId,
    /// Comma-joined tag list.
    pub tags: String,
    pub difficulty: Difficulty,
    pub metadata: EvalMetadata,
    pub created_at: DateTime<Utc>,
}

impl Eval {
    pub fn generated(
        creator_model_id: ModelId,
        question_text: String,
        tags: &[String],
        difficulty: Difficulty,
        metadata: GeneratedMetadata,
    ) -> Self {
        Self {
            id: EvalId::new(),
            question_text,
            creator_model_id,
            tags: join_tags(tags),
            difficulty,
            metadata: EvalMetadata::Generated(metadata),
            created_at: Utc::now(),
        }
    }

    /// Placeholder row recording why generation failed.
    pub fn failed(creator_model_id: ModelId, error: String, generation_params: GenerationParams) -> Self {
        Self {
            id: EvalId::new(),
            question_text: format!("Error generating eval: {}", error),
            creator_model_id,
            tags: ERROR_TAG.to_string(),
            difficulty: Difficulty::Unknown,
            metadata: EvalMetadata::Failed(FailedMetadata {
                error,
                generation_params,
            }),
            created_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.metadata.is_failed()
    }

    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }

    pub fn apply(&mut self, update: EvalUpdate) {
        if let Some(question_text) = update.question_text {
            self.question_text = question_text;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(difficulty) = update.difficulty {
            self.difficulty = difficulty;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvalUpdate {
    pub question_text: Option<String>,
    pub tags: Option<String>,
    pub difficulty: Option<Difficulty>,
}

/// Joins tags with `,`, trimming each and dropping empty entries.
pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params() -> GenerationParams {
        GenerationParams {
            prompt: "rust ownership".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            question_number: 1,
            number_of_questions: 2,
        }
    }

    #[test]
    fn failed_eval_is_tagged_error_with_unknown_difficulty() {
        let eval = Eval::failed(ModelId::new(), "boom".to_string(), params());
        assert_eq!(eval.tags, "error");
        assert_eq!(eval.difficulty, Difficulty::Unknown);
        assert!(eval.question_text.contains("boom"));
        assert!(eval.is_error());
    }

    #[test]
    fn metadata_serializes_with_kind_discriminator() {
        let meta = EvalMetadata::Generated(GeneratedMetadata {
            expected_format: "short text".to_string(),
            example_answer: "42".to_string(),
            validation_criteria: vec!["is a number".to_string()],
            skills_tested: vec!["arithmetic".to_string()],
            estimated_time_minutes: 2,
            generation_params: params(),
        });
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["kind"], "generated");
        assert_eq!(json["skillsTested"][0], "arithmetic");
        assert_eq!(json["estimatedTimeMinutes"], 2);
        assert_eq!(json["generationParams"]["questionNumber"], 1);

        let back: EvalMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn failed_metadata_has_no_skills() {
        let meta = EvalMetadata::Failed(FailedMetadata {
            error: "timeout".to_string(),
            generation_params: params(),
        });
        assert_eq!(meta.skills_tested(), None);
        assert_eq!(meta.estimated_time_minutes(), None);
        assert_eq!(serde_json::to_value(&meta).unwrap()["kind"], "failed");
    }

    #[test]
    fn tags_are_trimmed_and_joined_with_commas() {
        let tags = vec![" rust ".to_string(), "".to_string(), "memory".to_string()];
        assert_eq!(join_tags(&tags), "rust,memory");
        assert_eq!(split_tags("rust, memory,,"), vec!["rust", "memory"]);
    }

    #[test]
    fn difficulty_parse_is_case_sensitive() {
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("Hard".parse::<Difficulty>().is_err());
    }
}
