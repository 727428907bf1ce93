mod aptitude;
mod coding;

pub use aptitude::grade_answers;
pub use coding::score_submission;

use serde::{Deserialize, Serialize};

use super::domain::{ProctoringState, RoundTag};

/// Weighting rubric and penalty dials for the overall score, plus the
/// aptitude cutoff consumed by the round gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub aptitude_weight: f64,
    pub coding_weight: f64,
    pub hr_weight: f64,
    pub tab_switch_penalty: u32,
    pub tab_switch_penalty_cap: u32,
    pub aptitude_cutoff_percent: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            aptitude_weight: 0.3,
            coding_weight: 0.3,
            hr_weight: 0.4,
            tab_switch_penalty: 2,
            tab_switch_penalty_cap: 20,
            aptitude_cutoff_percent: 70.0,
        }
    }
}

/// Transparent decomposition of the final score, kept alongside the report
/// so the weighting can be audited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub aptitude_percent: Option<f64>,
    pub coding_percent: Option<f64>,
    pub hr_score: Option<f64>,
    pub proctoring_penalty: f64,
    pub overall: u8,
}

/// Pure calculator: identical inputs always produce an identical overall
/// score, including the hr score handed back by the generator.
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    config: ScoringConfig,
}

impl ScoreCalculator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Weighted full-interview score with the tab-switch penalty applied.
    pub fn full_interview(
        &self,
        aptitude_percent: f64,
        coding_percent: f64,
        hr_score: f64,
        proctoring: &ProctoringState,
    ) -> ScoreBreakdown {
        let penalty = self.proctoring_penalty(proctoring);
        let raw = aptitude_percent * self.config.aptitude_weight
            + coding_percent * self.config.coding_weight
            + hr_score * self.config.hr_weight
            - penalty;

        ScoreBreakdown {
            aptitude_percent: Some(aptitude_percent),
            coding_percent: Some(coding_percent),
            hr_score: Some(hr_score),
            proctoring_penalty: penalty,
            overall: clamp_to_score(raw),
        }
    }

    /// Practice sessions surface the round's own score untouched: no
    /// weighting, no proctoring penalty.
    pub fn single_round(&self, round: RoundTag, score: f64) -> ScoreBreakdown {
        let mut breakdown = ScoreBreakdown {
            aptitude_percent: None,
            coding_percent: None,
            hr_score: None,
            proctoring_penalty: 0.0,
            overall: clamp_to_score(score),
        };
        match round {
            RoundTag::Aptitude => breakdown.aptitude_percent = Some(score),
            RoundTag::Coding => breakdown.coding_percent = Some(score),
            RoundTag::Hr => breakdown.hr_score = Some(score),
        }
        breakdown
    }

    pub fn proctoring_penalty(&self, proctoring: &ProctoringState) -> f64 {
        let accumulated = proctoring
            .tab_switch_count
            .saturating_mul(self.config.tab_switch_penalty);
        f64::from(accumulated.min(self.config.tab_switch_penalty_cap))
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

fn clamp_to_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}
