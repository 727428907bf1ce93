use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;

use interview_ai::workflows::interview::{
    fallback, Assessment, AssessmentRequest, CodingProblem, Difficulty, ExecutionOutcome,
    Generator, GeneratorError, HrTurn, Language, Question, SessionRecord, SessionStore, StoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stand-in for the external document store: append-only, process-local.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    records: Arc<Mutex<Vec<SessionRecord>>>,
}

impl InMemorySessionStore {
    pub(crate) fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, record: SessionRecord) -> Result<String, StoreError> {
        let id = record.session_id.clone();
        self.records
            .lock()
            .expect("store mutex poisoned")
            .push(record);
        Ok(id)
    }
}

/// Deterministic generator for demos and offline operation: canned question
/// bank, scripted HR follow-ups, and a fixed qualitative judgment.
pub(crate) struct CannedGenerator;

const HR_FOLLOW_UPS: &[&str] = &[
    "Hello, can you start by telling me a little bit about yourself?",
    "What drew you to this role?",
    "Tell me about a time you disagreed with a teammate and how it resolved.",
    "Where do you want to grow over the next two years?",
];

#[async_trait]
impl Generator for CannedGenerator {
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
        code: &str,
        _language: Language,
    ) -> Result<ExecutionOutcome, GeneratorError> {
        // Cheap simulation: solutions that index the sample input "work".
        if code.contains("interviewace") {
            Ok(ExecutionOutcome::Output("1".to_string()))
        } else {
            Ok(ExecutionOutcome::Output("-1".to_string()))
        }
    }

    async fn next_hr_question(
        &self,
        _candidate_name: &str,
        _job_title: &str,
        history: &[HrTurn],
    ) -> Result<String, GeneratorError> {
        let asked = history
            .iter()
            .filter(|turn| {
                matches!(
                    turn.speaker,
                    interview_ai::workflows::interview::Speaker::Interviewer
                )
            })
            .count();
        let question = HR_FOLLOW_UPS
            .get(asked.min(HR_FOLLOW_UPS.len() - 1))
            .copied()
            .unwrap_or(HR_FOLLOW_UPS[0]);
        Ok(question.to_string())
    }

    async fn assess(&self, request: &AssessmentRequest) -> Result<Assessment, GeneratorError> {
        let hr_score = if request.transcript.is_empty() {
            None
        } else {
            Some(82.0)
        };
        Ok(Assessment {
            hr_score,
            strengths: vec![
                "Answered with concrete examples".to_string(),
                "Stayed structured under follow-up questions".to_string(),
            ],
            improvements: vec![
                "Quantify the impact of past projects".to_string(),
                "Walk through edge cases before submitting code".to_string(),
            ],
        })
    }
}
