use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{FeedbackReport, HrTurn, InterviewMode, ProctoringState};

/// Append-only document persisted once per completed session. Abandoned and
/// failed sessions never produce a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub job_title: String,
    pub candidate_name: String,
    pub mode: InterviewMode,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub overall_score: u8,
    pub aptitude_percent: Option<f64>,
    pub coding_percent: Option<f64>,
    pub hr_transcript: Vec<HrTurn>,
    pub proctoring: ProctoringState,
    pub report: FeedbackReport,
}

/// Storage abstraction over the external document store. Fire-and-forget
/// contract: the returned id is informational within a run.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, record: SessionRecord) -> Result<String, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
