use serde::{Deserialize, Serialize};

use super::eval::{Difficulty, Eval};
use super::ids::{EvalId, ModelId};
use super::judgment::Judgment;
use super::result::RunResult;

/// How the tag filter compares requested tags against an eval's tag string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// The requested tags joined with `,` must appear verbatim inside the
    /// stored tag string. `"rust"` matches `"rustlang"`; `["b","a"]` does not
    /// match `"a,b"`.
    #[default]
    Substring,
    /// Every requested tag must be a member of the stored comma-split set.
    Exact,
}

/// Inclusive bounds on `estimatedTimeMinutes`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TimeRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl TimeRange {
    pub fn contains(&self, minutes: u32) -> bool {
        self.min.map_or(true, |min| minutes >= min) && self.max.map_or(true, |max| minutes <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Conjunctive eval filter. Absent fields and empty sets impose nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvalFilter {
    pub difficulty: Option<Difficulty>,
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub tag_match: TagMatch,
    pub creator_model_ids: Option<Vec<ModelId>>,
    pub skills_tested: Option<Vec<String>>,
    pub estimated_time_range: Option<TimeRange>,
}

impl EvalFilter {
    pub fn tags(&self) -> Option<&[String]> {
        non_empty(&self.tags)
    }

    pub fn creator_model_ids(&self) -> Option<&[ModelId]> {
        non_empty(&self.creator_model_ids)
    }

    pub fn skills_tested(&self) -> Option<&[String]> {
        non_empty(&self.skills_tested)
    }

    pub fn time_range(&self) -> Option<&TimeRange> {
        self.estimated_time_range.as_ref().filter(|r| !r.is_unbounded())
    }

    /// The needle used by substring tag matching.
    pub fn joined_tags(&self) -> Option<String> {
        self.tags().map(|tags| tags.join(","))
    }

    pub fn matches(&self, eval: &Eval) -> bool {
        if let Some(difficulty) = self.difficulty {
            if eval.difficulty != difficulty {
                return false;
            }
        }

        if let Some(tags) = self.tags() {
            let matched = match self.tag_match {
                TagMatch::Substring => self.joined_tags().is_some_and(|needle| eval.tags.contains(&needle)),
                TagMatch::Exact => {
                    let stored = eval.tag_list();
                    tags.iter().all(|t| stored.iter().any(|s| s == t.trim()))
                }
            };
            if !matched {
                return false;
            }
        }

        if let Some(creators) = self.creator_model_ids() {
            if !creators.contains(&eval.creator_model_id) {
                return false;
            }
        }

        if let Some(skills) = self.skills_tested() {
            match eval.metadata.skills_tested() {
                Some(tested) if skills.iter().all(|s| tested.contains(s)) => {}
                _ => return false,
            }
        }

        if let Some(range) = self.time_range() {
            match eval.metadata.estimated_time_minutes() {
                Some(minutes) if range.contains(minutes) => {}
                _ => return false,
            }
        }

        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultFilter {
    pub eval_id: Option<EvalId>,
    pub model_id: Option<ModelId>,
}

impl ResultFilter {
    pub fn for_eval(eval_id: EvalId) -> Self {
        Self {
            eval_id: Some(eval_id),
            model_id: None,
        }
    }

    pub fn matches(&self, result: &RunResult) -> bool {
        self.eval_id.map_or(true, |id| result.eval_id == id)
            && self.model_id.map_or(true, |id| result.model_id == id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentFilter {
    pub eval_id: Option<EvalId>,
    pub judge_model_id: Option<ModelId>,
}

impl JudgmentFilter {
    pub fn for_eval(eval_id: EvalId) -> Self {
        Self {
            eval_id: Some(eval_id),
            judge_model_id: None,
        }
    }

    pub fn matches(&self, judgment: &Judgment) -> bool {
        self.eval_id.map_or(true, |id| judgment.eval_id == id)
            && self.judge_model_id.map_or(true, |id| judgment.judge_model_id == id)
    }
}

fn non_empty<T>(values: &Option<Vec<T>>) -> Option<&[T]> {
    values.as_deref().filter(|v| !v.is_empty())
}
