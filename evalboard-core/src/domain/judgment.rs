use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EvalId, JudgmentId, ModelId};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Judgment {
    pub id: JudgmentId,
    pub eval_id: EvalId,
    pub judge_model_id: ModelId,
    /// Intended range is [0, 1]; storage does not enforce it.
    pub score: f64,
    pub justification_text: String,
    pub created_at: DateTime<Utc>,
}

impl Judgment {
    pub fn new(eval_id: EvalId, judge_model_id: ModelId, score: f64, justification_text: String) -> Self {
        Self {
            id: JudgmentId::new(),
            eval_id,
            judge_model_id,
            score,
            justification_text,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, update: JudgmentUpdate) {
        if let Some(score) = update.score {
            self.score = score;
        }
        if let Some(justification_text) = update.justification_text {
            self.justification_text = justification_text;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentUpdate {
    pub score: Option<f64>,
    pub justification_text: Option<String>,
}

/// Scale the judge model is asked to score on. Scores are stored normalized
/// to [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl Default for RatingScale {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl RatingScale {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let scale = Self { min, max };
        scale.check()?;
        Ok(scale)
    }

    pub fn check(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(CoreError::Validation(format!(
                "rating scale minimum ({}) must be less than maximum ({})",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Maps a raw score on this scale to [0, 1]. Out-of-range scores are
    /// rejected rather than clamped.
    pub fn normalize(&self, raw: f64) -> Result<f64> {
        if !raw.is_finite() || raw < self.min || raw > self.max {
            return Err(CoreError::Validation(format!(
                "score {} outside rating scale [{}, {}]",
                raw, self.min, self.max
            )));
        }
        Ok((raw - self.min) / (self.max - self.min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RatingScale::default(), 0.25, 0.25)]
    #[case(RatingScale { min: 1.0, max: 10.0 }, 1.0, 0.0)]
    #[case(RatingScale { min: 1.0, max: 10.0 }, 10.0, 1.0)]
    #[case(RatingScale { min: 0.0, max: 4.0 }, 3.0, 0.75)]
    fn normalize_maps_scale_onto_unit_interval(
        #[case] scale: RatingScale,
        #[case] raw: f64,
        #[case] expected: f64,
    ) {
        assert!((scale.normalize(raw).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let scale = RatingScale::new(1.0, 10.0).unwrap();
        assert!(scale.normalize(11.0).is_err());
        assert!(scale.normalize(f64::NAN).is_err());
    }

    #[test]
    fn inverted_scale_is_rejected() {
        assert!(RatingScale::new(10.0, 1.0).is_err());
        assert!(RatingScale::new(5.0, 5.0).is_err());
    }
}
