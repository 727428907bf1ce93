use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex as SessionLock;

use super::domain::{
    CodingProblem, FeedbackReport, InterviewMode, Language, ProctoringState, Question, RoundTag,
};
use super::generator::Generator;
use super::machine::{MediaPermission, SessionError};
use super::proctoring::VideoAnalysis;
use super::report::failed_round_notice;
use super::scoring::ScoreBreakdown;
use super::service::{
    FlowSettings, InterviewFlow, InterviewFlowError, NextStage, RoundEntry,
};
use super::store::SessionStore;

/// Holds every live flow behind a per-session async mutex. The mutex is the
/// single-flight guard: a second request for the same session while one is in
/// flight gets a conflict response instead of a duplicate transition.
pub struct InterviewRegistry<G, S> {
    generator: Arc<G>,
    store: Arc<S>,
    settings: FlowSettings,
    flows: Mutex<HashMap<String, Arc<SessionLock<InterviewFlow<G, S>>>>>,
}

impl<G, S> InterviewRegistry<G, S>
where
    G: Generator,
    S: SessionStore,
{
    pub fn new(generator: Arc<G>, store: Arc<S>, settings: FlowSettings) -> Self {
        Self {
            generator,
            store,
            settings,
            flows: Mutex::new(HashMap::new()),
        }
    }

    pub fn create(
        &self,
        job_title: impl Into<String>,
        candidate_name: impl Into<String>,
        mode: InterviewMode,
    ) -> String {
        let flow = InterviewFlow::new(
            job_title,
            candidate_name,
            mode,
            self.generator.clone(),
            self.store.clone(),
            self.settings.clone(),
        );
        let session_id = flow.session().id.0.clone();

        let mut guard = self.flows.lock().expect("registry mutex poisoned");
        guard.insert(session_id.clone(), Arc::new(SessionLock::new(flow)));
        session_id
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<SessionLock<InterviewFlow<G, S>>>> {
        let guard = self.flows.lock().expect("registry mutex poisoned");
        guard.get(session_id).cloned()
    }

    /// Drop the flow from the registry; abandoned sessions are discarded, not
    /// persisted.
    pub fn discard(&self, session_id: &str) -> Option<Arc<SessionLock<InterviewFlow<G, S>>>> {
        let mut guard = self.flows.lock().expect("registry mutex poisoned");
        guard.remove(session_id)
    }
}

/// Router builder exposing the interview session endpoints.
pub fn interview_router<G, S>(registry: Arc<InterviewRegistry<G, S>>) -> Router
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/interviews", post(create_handler::<G, S>))
        .route(
            "/api/v1/interviews/:session_id",
            get(status_handler::<G, S>).delete(abandon_handler::<G, S>),
        )
        .route(
            "/api/v1/interviews/:session_id/start",
            post(start_handler::<G, S>),
        )
        .route(
            "/api/v1/interviews/:session_id/aptitude",
            post(aptitude_handler::<G, S>),
        )
        .route(
            "/api/v1/interviews/:session_id/advance",
            post(advance_handler::<G, S>),
        )
        .route(
            "/api/v1/interviews/:session_id/run",
            post(run_handler::<G, S>),
        )
        .route(
            "/api/v1/interviews/:session_id/coding",
            post(coding_handler::<G, S>),
        )
        .route(
            "/api/v1/interviews/:session_id/hr",
            post(hr_handler::<G, S>),
        )
        .route(
            "/api/v1/interviews/:session_id/hr/finish",
            post(hr_finish_handler::<G, S>),
        )
        .route(
            "/api/v1/interviews/:session_id/tab-switch",
            post(tab_switch_handler::<G, S>),
        )
        .route(
            "/api/v1/interviews/:session_id/finalize",
            post(finalize_handler::<G, S>),
        )
        .with_state(registry)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSessionRequest {
    #[serde(default = "default_job_title")]
    pub(crate) job_title: String,
    #[serde(default = "default_candidate_name")]
    pub(crate) candidate_name: String,
    #[serde(default)]
    pub(crate) mode: Option<InterviewMode>,
}

fn default_job_title() -> String {
    "Software Engineer".to_string()
}

fn default_candidate_name() -> String {
    "Candidate".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartRequest {
    pub(crate) permission: PermissionParam,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PermissionParam {
    Granted,
    Denied,
}

impl From<PermissionParam> for MediaPermission {
    fn from(value: PermissionParam) -> Self {
        match value {
            PermissionParam::Granted => MediaPermission::Granted,
            PermissionParam::Denied => MediaPermission::Denied,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AptitudeSubmission {
    pub(crate) answers: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CodeSubmission {
    pub(crate) code: String,
    pub(crate) language: Language,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HrReply {
    pub(crate) answer: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FinalizeRequest {
    #[serde(default)]
    pub(crate) video_analysis: Option<VideoAnalysis>,
}

#[derive(Debug, Serialize)]
struct QuestionView {
    kind: &'static str,
    prompt: String,
    options: Vec<String>,
}

fn question_views(questions: &[Question]) -> Vec<QuestionView> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| QuestionView {
            kind: question.kind.label(),
            prompt: question.prompt.clone(),
            options: question.presented_options(index),
        })
        .collect()
}

/// Problem as shown to the candidate; the expected output marker stays
/// server-side so submissions cannot be reverse-engineered from the API.
#[derive(Debug, Serialize)]
struct CodingProblemView {
    title: String,
    difficulty: &'static str,
    description: String,
    example1: String,
    example2: String,
    starter_code: std::collections::BTreeMap<Language, String>,
}

impl From<&CodingProblem> for CodingProblemView {
    fn from(problem: &CodingProblem) -> Self {
        Self {
            title: problem.title.clone(),
            difficulty: problem.difficulty.label(),
            description: problem.description.clone(),
            example1: problem.example1.clone(),
            example2: problem.example2.clone(),
            starter_code: problem.starter_code.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "round", rename_all = "snake_case")]
enum RoundEntryView {
    Aptitude {
        questions: Vec<QuestionView>,
        time_limit_secs: u32,
    },
    Coding {
        problem: CodingProblemView,
    },
    Hr {
        opening_question: String,
    },
}

impl From<&RoundEntry> for RoundEntryView {
    fn from(entry: &RoundEntry) -> Self {
        match entry {
            RoundEntry::Aptitude(plan) => RoundEntryView::Aptitude {
                questions: question_views(&plan.questions),
                time_limit_secs: plan.time_limit_secs,
            },
            RoundEntry::Coding(problem) => RoundEntryView::Coding {
                problem: problem.into(),
            },
            RoundEntry::Hr { opening_question } => RoundEntryView::Hr {
                opening_question: opening_question.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "next", rename_all = "snake_case")]
enum StageView {
    Coding { problem: CodingProblemView },
    Hr { opening_question: String },
    Feedback,
    Failed { notice: String },
}

impl From<&NextStage> for StageView {
    fn from(stage: &NextStage) -> Self {
        match stage {
            NextStage::Coding(problem) => StageView::Coding {
                problem: problem.into(),
            },
            NextStage::Hr { opening_question } => StageView::Hr {
                opening_question: opening_question.clone(),
            },
            NextStage::Feedback => StageView::Feedback,
            NextStage::Failed => StageView::Failed {
                notice: failed_round_notice(RoundTag::Aptitude),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub job_title: String,
    pub candidate_name: String,
    pub mode: InterviewMode,
    pub step: &'static str,
    pub status: &'static str,
    pub aptitude_percent: Option<f64>,
    pub coding_percent: Option<f64>,
    pub overall_score: Option<u8>,
    pub proctoring: ProctoringState,
}

fn session_view<G, S>(flow: &InterviewFlow<G, S>) -> SessionView
where
    G: Generator,
    S: SessionStore,
{
    let session = flow.session();
    SessionView {
        session_id: session.id.0.clone(),
        job_title: session.job_title.clone(),
        candidate_name: session.candidate_name.clone(),
        mode: session.mode,
        step: flow.step().label(),
        status: session.status.label(),
        aptitude_percent: session
            .rounds
            .aptitude
            .as_ref()
            .map(|result| result.score_percent),
        coding_percent: session
            .rounds
            .coding
            .as_ref()
            .map(|result| result.score_percent),
        overall_score: session
            .report
            .as_ref()
            .map(|report| report.overall_score),
        proctoring: flow.proctoring().clone(),
    }
}

#[derive(Debug, Serialize)]
struct FinalizeView {
    report: FeedbackReport,
    breakdown: Option<ScoreBreakdown>,
}

pub(crate) async fn create_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    axum::Json(request): axum::Json<CreateSessionRequest>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let mode = request.mode.unwrap_or(InterviewMode::Full);
    let session_id = registry.create(request.job_title, request.candidate_name, mode);
    (
        StatusCode::CREATED,
        axum::Json(json!({ "session_id": session_id, "step": "welcome" })),
    )
        .into_response()
}

pub(crate) async fn start_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<StartRequest>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(mut flow) = slot.try_lock() else {
        return busy_response();
    };

    match flow.start(request.permission.into()).await {
        Ok(entry) => {
            (StatusCode::OK, axum::Json(RoundEntryView::from(&entry))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn aptitude_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AptitudeSubmission>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(mut flow) = slot.try_lock() else {
        return busy_response();
    };

    match flow.submit_aptitude(request.answers) {
        Ok(outcome) => (
            StatusCode::OK,
            axum::Json(json!({
                "score_percent": outcome.score_percent,
                "step": flow.step().label(),
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(mut flow) = slot.try_lock() else {
        return busy_response();
    };

    match flow.advance_after_results().await {
        Ok(stage) => (StatusCode::OK, axum::Json(StageView::from(&stage))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn run_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<CodeSubmission>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(mut flow) = slot.try_lock() else {
        return busy_response();
    };

    match flow.run_code(&request.code, request.language).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn coding_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<CodeSubmission>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(mut flow) = slot.try_lock() else {
        return busy_response();
    };

    match flow.submit_coding(&request.code, request.language).await {
        Ok(advance) => (
            StatusCode::OK,
            axum::Json(json!({
                "score_percent": advance.score_percent,
                "stage": StageView::from(&advance.next),
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn hr_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<HrReply>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(mut flow) = slot.try_lock() else {
        return busy_response();
    };

    match flow.hr_reply(&request.answer).await {
        Ok(next_question) => (
            StatusCode::OK,
            axum::Json(json!({ "next_question": next_question })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn hr_finish_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(mut flow) = slot.try_lock() else {
        return busy_response();
    };

    match flow.finish_hr() {
        Ok(step) => {
            (StatusCode::OK, axum::Json(json!({ "step": step.label() }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn tab_switch_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(mut flow) = slot.try_lock() else {
        return busy_response();
    };

    flow.record_tab_hidden();
    StatusCode::NO_CONTENT.into_response()
}

pub(crate) async fn finalize_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<FinalizeRequest>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(mut flow) = slot.try_lock() else {
        return busy_response();
    };

    match flow.finalize(request.video_analysis).await {
        Ok(report) => (
            StatusCode::OK,
            axum::Json(FinalizeView {
                report,
                breakdown: flow.breakdown().cloned(),
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.get(&session_id) else {
        return not_found(&session_id);
    };
    let Ok(flow) = slot.try_lock() else {
        return busy_response();
    };

    (StatusCode::OK, axum::Json(session_view(&flow))).into_response()
}

pub(crate) async fn abandon_handler<G, S>(
    State(registry): State<Arc<InterviewRegistry<G, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: Generator + 'static,
    S: SessionStore + 'static,
{
    let Some(slot) = registry.discard(&session_id) else {
        return not_found(&session_id);
    };
    let mut flow = slot.lock().await;
    flow.abandon();
    StatusCode::NO_CONTENT.into_response()
}

fn error_response(err: InterviewFlowError) -> Response {
    let status = match &err {
        InterviewFlowError::Session(SessionError::PermissionDenied) => StatusCode::FORBIDDEN,
        InterviewFlowError::Session(SessionError::InvalidTransition { .. })
        | InterviewFlowError::Busy => StatusCode::CONFLICT,
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}

fn not_found(session_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({ "error": format!("no session '{session_id}'") })),
    )
        .into_response()
}

fn busy_response() -> Response {
    (
        StatusCode::CONFLICT,
        axum::Json(json!({ "error": "another request is in flight for this session" })),
    )
        .into_response()
}
