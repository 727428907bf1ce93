use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::interview::domain::{
    CodingProblem, Difficulty, ExecutionOutcome, HrTurn, InterviewMode, Language, Question,
};
use crate::workflows::interview::fallback;
use crate::workflows::interview::generator::{
    Assessment, AssessmentRequest, Generator, GeneratorError,
};
use crate::workflows::interview::service::{FlowSettings, InterviewFlow};
use crate::workflows::interview::store::{SessionRecord, SessionStore, StoreError};

/// Deterministic generator backed by the canned fallback artifacts, with a
/// configurable execution outcome and hr judgment.
pub(super) struct ScriptedGenerator {
    pub(super) run_outcome: ExecutionOutcome,
    pub(super) assessment: Assessment,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            run_outcome: ExecutionOutcome::Output("1".to_string()),
            assessment: Assessment {
                hr_score: Some(90.0),
                strengths: vec!["Communicates clearly".to_string()],
                improvements: vec!["Quantify project impact".to_string()],
            },
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn aptitude_questions(&self, _count: usize) -> Result<Vec<Question>, GeneratorError> {
        Ok(fallback::aptitude_questions())
    }

    async fn coding_problem(
        &self,
        _difficulty: Difficulty,
    ) -> Result<CodingProblem, GeneratorError> {
        Ok(fallback::coding_problem())
    }

    async fn run_code(
        &self,
        _code: &str,
        _language: Language,
    ) -> Result<ExecutionOutcome, GeneratorError> {
        Ok(self.run_outcome.clone())
    }

    async fn next_hr_question(
        &self,
        _candidate_name: &str,
        _job_title: &str,
        history: &[HrTurn],
    ) -> Result<String, GeneratorError> {
        if history.is_empty() {
            Ok("Tell me about yourself.".to_string())
        } else {
            Ok(format!("Follow-up question {}", history.len()))
        }
    }

    async fn assess(&self, _request: &AssessmentRequest) -> Result<Assessment, GeneratorError> {
        Ok(self.assessment.clone())
    }
}

/// Every call fails; flows must still reach feedback on fallbacks alone.
pub(super) struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn aptitude_questions(&self, _count: usize) -> Result<Vec<Question>, GeneratorError> {
        Err(GeneratorError::Unavailable("offline".to_string()))
    }

    async fn coding_problem(
        &self,
        _difficulty: Difficulty,
    ) -> Result<CodingProblem, GeneratorError> {
        Err(GeneratorError::Unavailable("offline".to_string()))
    }

    async fn run_code(
        &self,
        _code: &str,
        _language: Language,
    ) -> Result<ExecutionOutcome, GeneratorError> {
        Err(GeneratorError::Unavailable("offline".to_string()))
    }

    async fn next_hr_question(
        &self,
        _candidate_name: &str,
        _job_title: &str,
        _history: &[HrTurn],
    ) -> Result<String, GeneratorError> {
        Err(GeneratorError::Unavailable("offline".to_string()))
    }

    async fn assess(&self, _request: &AssessmentRequest) -> Result<Assessment, GeneratorError> {
        Err(GeneratorError::Unavailable("offline".to_string()))
    }
}

/// Returns schema-violating questions so the defensive validation path is
/// exercised end-to-end.
pub(super) struct MalformedGenerator;

#[async_trait]
impl Generator for MalformedGenerator {
    async fn aptitude_questions(&self, _count: usize) -> Result<Vec<Question>, GeneratorError> {
        Ok(vec![Question {
            kind: crate::workflows::interview::domain::QuestionKind::Logical,
            prompt: "Pick the odd one out".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            correct_answer: "missing".to_string(),
        }])
    }

    async fn coding_problem(
        &self,
        _difficulty: Difficulty,
    ) -> Result<CodingProblem, GeneratorError> {
        let mut problem = fallback::coding_problem();
        problem.expected_marker = String::new();
        Ok(problem)
    }

    async fn run_code(
        &self,
        _code: &str,
        _language: Language,
    ) -> Result<ExecutionOutcome, GeneratorError> {
        Ok(ExecutionOutcome::Output("1".to_string()))
    }

    async fn next_hr_question(
        &self,
        _candidate_name: &str,
        _job_title: &str,
        _history: &[HrTurn],
    ) -> Result<String, GeneratorError> {
        Ok("Next question".to_string())
    }

    async fn assess(&self, _request: &AssessmentRequest) -> Result<Assessment, GeneratorError> {
        Ok(Assessment::default())
    }
}

/// Generator that outlasts any reasonable bound, for timeout coverage.
pub(super) struct StalledGenerator;

#[async_trait]
impl Generator for StalledGenerator {
    async fn aptitude_questions(&self, _count: usize) -> Result<Vec<Question>, GeneratorError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(fallback::aptitude_questions())
    }

    async fn coding_problem(
        &self,
        _difficulty: Difficulty,
    ) -> Result<CodingProblem, GeneratorError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(fallback::coding_problem())
    }

    async fn run_code(
        &self,
        _code: &str,
        _language: Language,
    ) -> Result<ExecutionOutcome, GeneratorError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(ExecutionOutcome::Output(String::new()))
    }

    async fn next_hr_question(
        &self,
        _candidate_name: &str,
        _job_title: &str,
        _history: &[HrTurn],
    ) -> Result<String, GeneratorError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(String::new())
    }

    async fn assess(&self, _request: &AssessmentRequest) -> Result<Assessment, GeneratorError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Assessment::default())
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingStore {
    records: Arc<Mutex<Vec<SessionRecord>>>,
}

impl RecordingStore {
    pub(super) fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn save(&self, record: SessionRecord) -> Result<String, StoreError> {
        let id = record.session_id.clone();
        self.records
            .lock()
            .expect("store mutex poisoned")
            .push(record);
        Ok(id)
    }
}

pub(super) struct UnavailableStore;

#[async_trait]
impl SessionStore for UnavailableStore {
    async fn save(&self, _record: SessionRecord) -> Result<String, StoreError> {
        Err(StoreError::Unavailable("document store offline".to_string()))
    }
}

pub(super) fn flow<G, S>(mode: InterviewMode, generator: G, store: S) -> InterviewFlow<G, S>
where
    G: Generator,
    S: SessionStore,
{
    InterviewFlow::new(
        "Software Engineer",
        "Candidate",
        mode,
        Arc::new(generator),
        Arc::new(store),
        FlowSettings::default(),
    )
}

pub(super) fn flow_with_settings<G, S>(
    mode: InterviewMode,
    generator: G,
    store: S,
    settings: FlowSettings,
) -> InterviewFlow<G, S>
where
    G: Generator,
    S: SessionStore,
{
    InterviewFlow::new(
        "Software Engineer",
        "Candidate",
        mode,
        Arc::new(generator),
        Arc::new(store),
        settings,
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Answers matching the canned fallback questions exactly.
pub(super) fn correct_fallback_answers() -> Vec<Option<String>> {
    vec![Some("4".to_string()), Some("New Delhi".to_string())]
}

pub(super) fn blank_answers(count: usize) -> Vec<Option<String>> {
    vec![None; count]
}
