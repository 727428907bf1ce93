use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;

use super::domain::{
    CodingProblem, Difficulty, ExecutionOutcome, HrTurn, Language, Question, QuestionKind, Speaker,
};
use super::generator::{
    validate_problem, validate_questions, Assessment, AssessmentRequest, Generator, GeneratorError,
    render_history,
};

/// JSON client for the hosted generator service. Thin by design: one POST
/// per operation, schema mapping, and error folding; all retry/fallback
/// policy lives with the caller.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| GeneratorError::Unavailable(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, GeneratorError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| GeneratorError::Unavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| GeneratorError::Unavailable(err.to_string()))?;

        response
            .json::<T>()
            .await
            .map_err(|err| GeneratorError::Malformed(err.to_string()))
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn aptitude_questions(&self, count: usize) -> Result<Vec<Question>, GeneratorError> {
        let body = AptitudeQuestionsRequest {
            number_of_questions: count,
        };
        let payload: AptitudeQuestionsResponse =
            self.post("/v1/aptitude-questions", &body).await?;

        let questions = payload
            .questions
            .into_iter()
            .map(WireQuestion::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        validate_questions(questions)
    }

    async fn coding_problem(
        &self,
        difficulty: Difficulty,
    ) -> Result<CodingProblem, GeneratorError> {
        let body = CodingProblemRequest { difficulty };
        let payload: WireCodingProblem = self.post("/v1/coding-problem", &body).await?;
        validate_problem(payload.into_problem())
    }

    async fn run_code(
        &self,
        code: &str,
        language: Language,
    ) -> Result<ExecutionOutcome, GeneratorError> {
        let body = RunCodeRequest {
            code: code.to_string(),
            language,
        };
        let payload: RunCodeResponse = self.post("/v1/run-code", &body).await?;
        Ok(match payload.error {
            Some(error) if !error.trim().is_empty() => ExecutionOutcome::Error(error),
            _ => ExecutionOutcome::Output(payload.output.unwrap_or_default()),
        })
    }

    async fn next_hr_question(
        &self,
        candidate_name: &str,
        job_title: &str,
        history: &[HrTurn],
    ) -> Result<String, GeneratorError> {
        let body = HrQuestionRequest {
            candidate_name: candidate_name.to_string(),
            job_title: job_title.to_string(),
            history: history.iter().map(WireHrTurn::from).collect(),
            rendered_history: render_history(history),
        };
        let payload: HrQuestionResponse = self.post("/v1/hr-question", &body).await?;
        if payload.next_question.trim().is_empty() {
            return Err(GeneratorError::Malformed(
                "hr question response was blank".to_string(),
            ));
        }
        Ok(payload.next_question)
    }

    async fn assess(&self, request: &AssessmentRequest) -> Result<Assessment, GeneratorError> {
        let body = AssessRequest {
            job_title: request.job_title.clone(),
            aptitude_score: request.aptitude_percent,
            coding_score: request.coding_percent,
            transcript: request.transcript.iter().map(WireHrTurn::from).collect(),
            tab_switches: request.proctoring.tab_switch_count,
            proctoring_summary: request.proctoring.summary.clone(),
        };
        let payload: AssessResponse = self.post("/v1/assess", &body).await?;
        Ok(Assessment {
            hr_score: payload.hr_score,
            strengths: payload.strengths.unwrap_or_default(),
            improvements: payload.improvements.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AptitudeQuestionsRequest {
    number_of_questions: usize,
}

#[derive(Debug, Deserialize)]
struct AptitudeQuestionsResponse {
    questions: Vec<WireQuestion>,
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    #[serde(rename = "type")]
    kind: String,
    question: String,
    options: Vec<String>,
    answer: String,
}

impl WireQuestion {
    fn into_question(self) -> Result<Question, GeneratorError> {
        let kind = match self.kind.to_ascii_lowercase().as_str() {
            "mathematical" => QuestionKind::Mathematical,
            "verbal" => QuestionKind::Verbal,
            "logical" => QuestionKind::Logical,
            other => {
                return Err(GeneratorError::Malformed(format!(
                    "unknown question type '{other}'"
                )))
            }
        };
        Ok(Question {
            kind,
            prompt: self.question,
            options: self.options,
            correct_answer: self.answer,
        })
    }
}

#[derive(Debug, Serialize)]
struct CodingProblemRequest {
    difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCodingProblem {
    title: String,
    difficulty: Difficulty,
    description: String,
    example1: String,
    example2: String,
    #[serde(default)]
    solution_templates: std::collections::BTreeMap<Language, String>,
    #[serde(default)]
    expected_marker: String,
}

impl WireCodingProblem {
    fn into_problem(self) -> CodingProblem {
        CodingProblem {
            title: self.title,
            difficulty: self.difficulty,
            description: self.description,
            example1: self.example1,
            example2: self.example2,
            starter_code: self.solution_templates,
            expected_marker: self.expected_marker,
        }
    }
}

#[derive(Debug, Serialize)]
struct RunCodeRequest {
    code: String,
    language: Language,
}

#[derive(Debug, Deserialize)]
struct RunCodeResponse {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HrQuestionRequest {
    candidate_name: String,
    job_title: String,
    history: Vec<WireHrTurn>,
    rendered_history: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HrQuestionResponse {
    next_question: String,
}

#[derive(Debug, Serialize)]
struct WireHrTurn {
    speaker: &'static str,
    text: String,
}

impl From<&HrTurn> for WireHrTurn {
    fn from(turn: &HrTurn) -> Self {
        Self {
            speaker: match turn.speaker {
                Speaker::Candidate => "user",
                Speaker::Interviewer => "ai",
            },
            text: turn.text.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessRequest {
    job_title: String,
    aptitude_score: Option<f64>,
    coding_score: Option<f64>,
    transcript: Vec<WireHrTurn>,
    tab_switches: u32,
    proctoring_summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssessResponse {
    #[serde(default)]
    hr_score: Option<f64>,
    #[serde(default)]
    strengths: Option<Vec<String>>,
    #[serde(default)]
    improvements: Option<Vec<String>>,
}
