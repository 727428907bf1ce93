use serde::{Deserialize, Serialize};

use super::domain::ProctoringState;

/// Batched video-analysis verdict delivered once, after the session's visual
/// step ends. Best-effort: a missing or failed analysis leaves the tracker's
/// tab-switch accumulation untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub confidence_level: f64,
    pub engagement_level: f64,
    pub malpractice_detected: bool,
    pub summary: String,
}

/// Accumulates malpractice signals into a single [`ProctoringState`].
///
/// The malpractice flag is a monotonic OR: once any signal sets it, nothing
/// within the session clears it again.
#[derive(Debug, Clone, Default)]
pub struct ProctoringTracker {
    state: ProctoringState,
}

impl ProctoringTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visibility signal: the document transitioned to hidden.
    pub fn record_tab_hidden(&mut self) {
        self.state.tab_switch_count = self.state.tab_switch_count.saturating_add(1);
        self.state.malpractice_detected = true;
    }

    /// Merge the video verdict. Confidence, engagement, and summary are
    /// overwritten (the analysis covers the whole recording); the malpractice
    /// flag only ever strengthens.
    pub fn apply_video_analysis(&mut self, analysis: VideoAnalysis) {
        self.state.video_confidence = analysis.confidence_level.clamp(0.0, 1.0);
        self.state.video_engagement = analysis.engagement_level.clamp(0.0, 1.0);
        self.state.malpractice_detected =
            self.state.malpractice_detected || analysis.malpractice_detected;
        self.state.summary = analysis.summary;
    }

    pub fn state(&self) -> &ProctoringState {
        &self.state
    }

    pub fn snapshot(&self) -> ProctoringState {
        self.state.clone()
    }
}
