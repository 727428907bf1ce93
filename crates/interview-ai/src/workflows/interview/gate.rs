use super::domain::RoundTag;
use super::scoring::ScoringConfig;

/// Stateless pass/fail predicate between rounds.
///
/// Only the aptitude round gates advancement in full-interview mode. An
/// earlier product variant also enforced a 60% coding cutoff; that variant is
/// deliberately not implemented — coding performance is informational.
#[derive(Debug, Clone)]
pub struct RoundGate {
    aptitude_cutoff_percent: f64,
}

impl RoundGate {
    pub fn new(aptitude_cutoff_percent: f64) -> Self {
        Self {
            aptitude_cutoff_percent,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.aptitude_cutoff_percent)
    }

    pub fn aptitude_cutoff_percent(&self) -> f64 {
        self.aptitude_cutoff_percent
    }

    /// Boundary inclusive: a score exactly at the cutoff passes.
    pub fn pass(&self, round: RoundTag, score_percent: f64) -> bool {
        match round {
            RoundTag::Aptitude => score_percent >= self.aptitude_cutoff_percent,
            RoundTag::Coding | RoundTag::Hr => true,
        }
    }
}

impl Default for RoundGate {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}
