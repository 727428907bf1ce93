use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{
    CodingProblem, Difficulty, ExecutionOutcome, HrTurn, Language, ProctoringState, Question,
};

/// Failures from the hosted generator. Malformed payloads are deliberately
/// folded into the same recovery path as outages: both degrade to the local
/// fallback artifacts rather than reaching the candidate.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),
    #[error("generator response malformed: {0}")]
    Malformed(String),
}

/// Qualitative verdict returned by the generator at feedback time. A missing
/// `hr_score` (practice rounds without an HR transcript, or a degraded
/// response) contributes zero to the weighted formula.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub hr_score: Option<f64>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// Everything the generator needs to judge a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub job_title: String,
    pub aptitude_percent: Option<f64>,
    pub coding_percent: Option<f64>,
    pub transcript: Vec<HrTurn>,
    pub proctoring: ProctoringState,
}

/// Black-box text/JSON generation service behind the orchestration core.
/// Stateless per call; every call may fail and callers hold a deterministic
/// fallback for each operation.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn aptitude_questions(&self, count: usize) -> Result<Vec<Question>, GeneratorError>;

    async fn coding_problem(&self, difficulty: Difficulty)
        -> Result<CodingProblem, GeneratorError>;

    /// Simulated execution: a pass-through to the generation service, not a
    /// sandboxed interpreter.
    async fn run_code(
        &self,
        code: &str,
        language: Language,
    ) -> Result<ExecutionOutcome, GeneratorError>;

    /// Next interviewer line given the transcript so far. An empty history
    /// requests the opening question.
    async fn next_hr_question(
        &self,
        candidate_name: &str,
        job_title: &str,
        history: &[HrTurn],
    ) -> Result<String, GeneratorError>;

    async fn assess(&self, request: &AssessmentRequest) -> Result<Assessment, GeneratorError>;
}

/// Reject question batches that violate the generator contract: empty
/// batches, option lists that are not four distinct entries, or a canonical
/// answer missing from its options.
pub fn validate_questions(questions: Vec<Question>) -> Result<Vec<Question>, GeneratorError> {
    if questions.is_empty() {
        return Err(GeneratorError::Malformed(
            "question batch was empty".to_string(),
        ));
    }
    for question in &questions {
        if !question.is_well_formed() {
            return Err(GeneratorError::Malformed(format!(
                "question '{}' lacks four distinct options containing its answer",
                question.prompt
            )));
        }
    }
    Ok(questions)
}

/// Reject coding problems missing the fields scoring depends on.
pub fn validate_problem(problem: CodingProblem) -> Result<CodingProblem, GeneratorError> {
    if problem.title.trim().is_empty() || problem.description.trim().is_empty() {
        return Err(GeneratorError::Malformed(
            "coding problem missing title or description".to_string(),
        ));
    }
    if problem.expected_marker.trim().is_empty() {
        return Err(GeneratorError::Malformed(
            "coding problem missing expected output marker".to_string(),
        ));
    }
    if problem.starter_code.is_empty() {
        return Err(GeneratorError::Malformed(
            "coding problem carries no starter code".to_string(),
        ));
    }
    Ok(problem)
}

/// Pure transcript rendering for generator requests: one line per turn,
/// replacing the runtime-templated conversation blocks of earlier product
/// iterations.
pub fn render_history(turns: &[HrTurn]) -> String {
    let mut rendered = String::new();
    for turn in turns {
        writeln!(rendered, "{}: {}", turn.speaker.label(), turn.text).expect("write turn");
    }
    rendered
}
