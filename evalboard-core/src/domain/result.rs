use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EvalId, ModelId, ResultId};

/// Output of running one eval against one model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub id: ResultId,
    pub eval_id: EvalId,
    pub model_id: ModelId,
    pub response_text: Option<String>,
    pub error_log: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RunResult {
    pub fn success(eval_id: EvalId, model_id: ModelId, response_text: String) -> Self {
        Self {
            id: ResultId::new(),
            eval_id,
            model_id,
            response_text: Some(response_text),
            error_log: None,
            created_at: Utc::now(),
        }
    }

    pub fn failure(eval_id: EvalId, model_id: ModelId, error_log: String) -> Self {
        Self {
            id: ResultId::new(),
            eval_id,
            model_id,
            response_text: None,
            error_log: Some(error_log),
            created_at: Utc::now(),
        }
    }

    /// A run failed when it carries a non-empty error log.
    pub fn is_failure(&self) -> bool {
        self.error_log.as_deref().is_some_and(|log| !log.is_empty())
    }

    /// Setting one side of the outcome clears the other.
    pub fn apply(&mut self, update: ResultUpdate) {
        if let Some(response_text) = update.response_text {
            self.response_text = Some(response_text);
            self.error_log = None;
        }
        if let Some(error_log) = update.error_log {
            self.error_log = Some(error_log);
            self.response_text = None;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultUpdate {
    pub response_text: Option<String>,
    pub error_log: Option<String>,
}
