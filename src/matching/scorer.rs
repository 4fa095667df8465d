//! Compatibility scoring

use crate::error::{EngineError, Result};
use crate::matching::profile::{
    CompatibilityScore, GapReport, JobId, ScoreBreakdown, SeniorityBand,
};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f32 = 1e-6;

/// Blend weights for the three score components. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScorerWeights {
    pub similarity: f32,
    pub gap: f32,
    pub experience: f32,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            similarity: 0.4,
            gap: 0.4,
            experience: 0.2,
        }
    }
}

impl ScorerWeights {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("similarity", self.similarity),
            ("gap", self.gap),
            ("experience", self.experience),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Configuration(format!(
                    "{} weight {} outside [0, 1]",
                    name, value
                )));
            }
        }
        let sum = self.similarity + self.gap + self.experience;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::Configuration(format!(
                "scorer weights sum to {}, expected 1.0",
                sum
            )));
        }
        Ok(())
    }
}

/// Combines similarity, gap severity, and experience alignment into one
/// bounded score. Pure: identical inputs always produce identical scores.
#[derive(Debug, Clone)]
pub struct CompatibilityScorer {
    weights: ScorerWeights,
    decay_per_year: f32,
    experience_floor: f32,
}

impl CompatibilityScorer {
    /// Weight validation happens here, at construction, so a bad
    /// configuration can never surface mid-request.
    pub fn new(
        weights: ScorerWeights,
        decay_per_year: f32,
        experience_floor: f32,
    ) -> Result<Self> {
        weights.validate()?;
        if decay_per_year < 0.0 {
            return Err(EngineError::Configuration(format!(
                "experience decay per year must be non-negative, got {}",
                decay_per_year
            )));
        }
        if !(0.0..=1.0).contains(&experience_floor) {
            return Err(EngineError::Configuration(format!(
                "experience floor {} outside [0, 1]",
                experience_floor
            )));
        }
        Ok(Self {
            weights,
            decay_per_year,
            experience_floor,
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            weights: ScorerWeights::default(),
            decay_per_year: 0.2,
            experience_floor: 0.2,
        }
    }

    /// score = clamp01(w1·similarity + w2·(1 − mean gap severity)
    ///                 + w3·experience alignment)
    ///
    /// `normalized_distance` is the index distance already mapped to [0, 1];
    /// similarity is its complement.
    pub fn score(
        &self,
        job: &JobId,
        normalized_distance: f32,
        gap_report: &GapReport,
        years_experience: f32,
        seniority: &SeniorityBand,
    ) -> CompatibilityScore {
        let similarity = (1.0 - normalized_distance).clamp(0.0, 1.0);
        let gap_penalty = gap_report.mean_weighted_severity();
        let experience_alignment = self.experience_alignment(years_experience, seniority);

        let score = (self.weights.similarity * similarity
            + self.weights.gap * (1.0 - gap_penalty)
            + self.weights.experience * experience_alignment)
            .clamp(0.0, 1.0);

        CompatibilityScore {
            job: job.clone(),
            score,
            breakdown: ScoreBreakdown {
                similarity,
                gap_penalty,
                experience_alignment,
            },
        }
    }

    /// 1.0 inside the seniority band, decaying linearly per year outside it
    /// down to the floor.
    fn experience_alignment(&self, years: f32, band: &SeniorityBand) -> f32 {
        let distance = band.distance(years.max(0.0));
        (1.0 - self.decay_per_year * distance).max(self.experience_floor)
    }
}
