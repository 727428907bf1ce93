use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::GeneratorConfig;

use super::domain::{
    AptitudeResult, CodingProblem, CodingResult, Difficulty, ExecutionOutcome, FeedbackReport,
    HrResult, HrTurn, InterviewMode, InterviewSession, Language, ProctoringState, Question,
    RoundTag, SessionId, SessionStatus,
};
use super::fallback;
use super::gate::RoundGate;
use super::generator::{
    validate_problem, validate_questions, Assessment, AssessmentRequest, Generator, GeneratorError,
};
use super::machine::{InterviewStep, MediaPermission, SessionError, SessionStateMachine};
use super::proctoring::{ProctoringTracker, VideoAnalysis};
use super::report::FeedbackComposer;
use super::scoring::{
    grade_answers, score_submission, ScoreBreakdown, ScoreCalculator, ScoringConfig,
};
use super::store::{SessionRecord, SessionStore};

const APTITUDE_TIME_LIMIT_SECS: u32 = 10 * 60;

/// Dials for one interview flow: the scoring rubric plus generator call
/// parameters. Collaborator waits share a single bound so no suspension
/// point can hang a session.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub scoring: ScoringConfig,
    pub collaborator_timeout: Duration,
    pub question_count: usize,
    pub difficulty: Difficulty,
}

impl FlowSettings {
    pub fn from_generator_config(config: &GeneratorConfig) -> Self {
        Self {
            collaborator_timeout: config.timeout(),
            question_count: config.question_count,
            difficulty: config.difficulty,
            ..Self::default()
        }
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            collaborator_timeout: Duration::from_secs(20),
            question_count: 5,
            difficulty: Difficulty::Medium,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InterviewFlowError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("finalize already in flight for this session")]
    Busy,
}

/// Aptitude round artifact handed to the caller on round entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AptitudeRoundPlan {
    pub questions: Vec<Question>,
    pub time_limit_secs: u32,
}

/// What the candidate faces first, depending on mode.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEntry {
    Aptitude(AptitudeRoundPlan),
    Coding(CodingProblem),
    Hr { opening_question: String },
}

/// Where the session moved after a gated or recorded round.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStage {
    Coding(CodingProblem),
    Hr { opening_question: String },
    Feedback,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AptitudeOutcome {
    pub score_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodingAdvance {
    pub score_percent: f64,
    pub next: NextStage,
}

/// Orchestrator for one candidate attempt. Owns the state machine, the
/// proctoring tracker, and the pending round artifacts; generic over the
/// generator and store collaborators so tests can exercise it hermetically.
///
/// Callers must not overlap submissions for the same session; the flow also
/// guards finalize re-entrancy defensively since duplicate UI events are the
/// common failure mode.
pub struct InterviewFlow<G, S> {
    machine: SessionStateMachine,
    tracker: ProctoringTracker,
    gate: RoundGate,
    calculator: ScoreCalculator,
    composer: FeedbackComposer,
    generator: Arc<G>,
    store: Arc<S>,
    settings: FlowSettings,
    pending_questions: Option<Vec<Question>>,
    pending_problem: Option<CodingProblem>,
    transcript: Vec<HrTurn>,
    breakdown: Option<ScoreBreakdown>,
    finalizing: bool,
}

impl<G, S> InterviewFlow<G, S>
where
    G: Generator,
    S: SessionStore,
{
    pub fn new(
        job_title: impl Into<String>,
        candidate_name: impl Into<String>,
        mode: InterviewMode,
        generator: Arc<G>,
        store: Arc<S>,
        settings: FlowSettings,
    ) -> Self {
        let session = InterviewSession::new(
            SessionId(Uuid::new_v4().to_string()),
            job_title,
            candidate_name,
            mode,
        );
        let gate = RoundGate::from_config(&settings.scoring);
        let calculator = ScoreCalculator::new(settings.scoring.clone());

        Self {
            machine: SessionStateMachine::new(session),
            tracker: ProctoringTracker::new(),
            gate,
            calculator,
            composer: FeedbackComposer::new(),
            generator,
            store,
            settings,
            pending_questions: None,
            pending_problem: None,
            transcript: Vec::new(),
            breakdown: None,
            finalizing: false,
        }
    }

    pub fn session(&self) -> &InterviewSession {
        self.machine.session()
    }

    pub fn step(&self) -> InterviewStep {
        self.machine.step()
    }

    pub fn proctoring(&self) -> &ProctoringState {
        self.tracker.state()
    }

    pub fn transcript(&self) -> &[HrTurn] {
        &self.transcript
    }

    pub fn breakdown(&self) -> Option<&ScoreBreakdown> {
        self.breakdown.as_ref()
    }

    /// Enter the first round for this mode. Permission denial surfaces as an
    /// error and leaves the machine in `Welcome`.
    pub async fn start(
        &mut self,
        permission: MediaPermission,
    ) -> Result<RoundEntry, InterviewFlowError> {
        let step = self.machine.start(permission)?;
        info!(
            session = %self.machine.session().id.0,
            step = step.label(),
            "interview started"
        );

        match step {
            InterviewStep::Aptitude => Ok(RoundEntry::Aptitude(self.begin_aptitude().await)),
            InterviewStep::Coding => Ok(RoundEntry::Coding(self.begin_coding().await)),
            InterviewStep::Hr => Ok(RoundEntry::Hr {
                opening_question: self.begin_hr().await,
            }),
            other => Err(SessionError::InvalidTransition {
                step: other.label(),
                event: "start",
            }
            .into()),
        }
    }

    /// Visibility signal from the proctoring widget. Ignored once capture has
    /// been released (terminal steps, abandonment).
    pub fn record_tab_hidden(&mut self) {
        if self.machine.proctoring_active() {
            self.tracker.record_tab_hidden();
        }
    }

    /// Grade the submitted answers and move to the results interstitial.
    pub fn submit_aptitude(
        &mut self,
        answers: Vec<Option<String>>,
    ) -> Result<AptitudeOutcome, InterviewFlowError> {
        self.expect_step(InterviewStep::Aptitude, "submit_aptitude")?;
        let questions = self
            .pending_questions
            .clone()
            .ok_or(SessionError::InvalidTransition {
                step: InterviewStep::Aptitude.label(),
                event: "submit_aptitude",
            })?;

        let score_percent = grade_answers(&questions, &answers);
        self.machine.record_aptitude(AptitudeResult {
            questions,
            answers,
            score_percent,
        })?;
        self.pending_questions = None;

        Ok(AptitudeOutcome { score_percent })
    }

    /// Candidate acknowledged the aptitude outcome; apply the gate.
    pub async fn advance_after_results(&mut self) -> Result<NextStage, InterviewFlowError> {
        let step = self.machine.advance_from_results(&self.gate)?;
        match step {
            InterviewStep::Coding => Ok(NextStage::Coding(self.begin_coding().await)),
            InterviewStep::Feedback => Ok(NextStage::Feedback),
            InterviewStep::Failed => {
                info!(
                    session = %self.machine.session().id.0,
                    "aptitude cutoff missed; session failed"
                );
                Ok(NextStage::Failed)
            }
            other => Err(SessionError::InvalidTransition {
                step: other.label(),
                event: "advance_after_results",
            }
            .into()),
        }
    }

    /// "Run" without submitting: returns the raw outcome for display, no
    /// scoring and no state change.
    pub async fn run_code(
        &mut self,
        code: &str,
        language: Language,
    ) -> Result<ExecutionOutcome, InterviewFlowError> {
        self.expect_step(InterviewStep::Coding, "run_code")?;
        Ok(self.execute(code, language).await)
    }

    /// Execute, score on the three-tier heuristic, and advance.
    pub async fn submit_coding(
        &mut self,
        code: &str,
        language: Language,
    ) -> Result<CodingAdvance, InterviewFlowError> {
        self.expect_step(InterviewStep::Coding, "submit_coding")?;
        let problem = self
            .pending_problem
            .clone()
            .ok_or(SessionError::InvalidTransition {
                step: InterviewStep::Coding.label(),
                event: "submit_coding",
            })?;

        let outcome = self.execute(code, language).await;
        let score_percent = score_submission(&outcome, &problem.expected_marker);

        let step = self.machine.record_coding(CodingResult {
            problem,
            submitted_code: code.to_string(),
            language,
            outcome,
            score_percent,
        })?;
        self.pending_problem = None;

        let next = match step {
            InterviewStep::Hr => NextStage::Hr {
                opening_question: self.begin_hr().await,
            },
            InterviewStep::Feedback => NextStage::Feedback,
            other => {
                return Err(SessionError::InvalidTransition {
                    step: other.label(),
                    event: "submit_coding",
                }
                .into())
            }
        };

        Ok(CodingAdvance {
            score_percent,
            next,
        })
    }

    /// One conversational turn: record the candidate's answer, fetch the next
    /// interviewer question (recovery question on generator failure).
    pub async fn hr_reply(&mut self, answer: &str) -> Result<String, InterviewFlowError> {
        self.expect_step(InterviewStep::Hr, "hr_reply")?;
        self.transcript.push(HrTurn::candidate(answer));

        let session = self.machine.session();
        let question = match self
            .bounded(self.generator.next_hr_question(
                &session.candidate_name,
                &session.job_title,
                &self.transcript,
            ))
            .await
        {
            Ok(question) => question,
            Err(err) => {
                warn!(%err, "hr question generation failed; using recovery question");
                fallback::hr_recovery_question()
            }
        };

        self.transcript.push(HrTurn::interviewer(question.clone()));
        Ok(question)
    }

    /// Close the HR round and move to feedback with the full transcript.
    pub fn finish_hr(&mut self) -> Result<InterviewStep, InterviewFlowError> {
        self.expect_step(InterviewStep::Hr, "finish_hr")?;
        let transcript = std::mem::take(&mut self.transcript);
        Ok(self.machine.record_hr(HrResult { transcript })?)
    }

    /// Score, compose, persist — exactly once. Re-invocation on a completed
    /// session returns the existing report without a second store write;
    /// overlapping invocations are rejected as busy.
    pub async fn finalize(
        &mut self,
        video: Option<VideoAnalysis>,
    ) -> Result<FeedbackReport, InterviewFlowError> {
        self.expect_step(InterviewStep::Feedback, "finalize")?;

        if self.machine.session().status == SessionStatus::Completed {
            if let Some(report) = self.machine.session().report.clone() {
                return Ok(report);
            }
        }
        if self.finalizing {
            return Err(InterviewFlowError::Busy);
        }
        self.finalizing = true;

        if let Some(analysis) = video {
            self.tracker.apply_video_analysis(analysis);
        }
        self.machine.session_mut().proctoring = self.tracker.snapshot();

        let assessment = self.fetch_assessment().await;
        let breakdown = self.compute_breakdown(&assessment);

        let session = self.machine.session();
        let report = self.composer.compose(
            session.mode,
            &session.job_title,
            &breakdown,
            &session.proctoring,
            &assessment,
            self.calculator.config(),
        );

        if let Err(err) = self.machine.complete(report.clone()) {
            self.finalizing = false;
            return Err(err.into());
        }

        self.persist(&report).await;
        self.breakdown = Some(breakdown);
        self.finalizing = false;
        Ok(report)
    }

    /// Candidate navigated away before feedback: release capture, discard.
    pub fn abandon(&mut self) {
        self.machine.abandon();
        info!(
            session = %self.machine.session().id.0,
            "session abandoned; partial results discarded"
        );
    }

    async fn begin_aptitude(&mut self) -> AptitudeRoundPlan {
        let questions = match self
            .bounded(
                self.generator
                    .aptitude_questions(self.settings.question_count),
            )
            .await
            .and_then(validate_questions)
        {
            Ok(questions) => questions,
            Err(err) => {
                warn!(%err, "question generation failed; substituting canned set");
                fallback::aptitude_questions()
            }
        };

        self.pending_questions = Some(questions.clone());
        AptitudeRoundPlan {
            questions,
            time_limit_secs: APTITUDE_TIME_LIMIT_SECS,
        }
    }

    async fn begin_coding(&mut self) -> CodingProblem {
        let problem = match self
            .bounded(self.generator.coding_problem(self.settings.difficulty))
            .await
            .and_then(validate_problem)
        {
            Ok(problem) => problem,
            Err(err) => {
                warn!(%err, "problem generation failed; substituting canned problem");
                fallback::coding_problem()
            }
        };

        self.pending_problem = Some(problem.clone());
        problem
    }

    async fn begin_hr(&mut self) -> String {
        let session = self.machine.session();
        let question = match self
            .bounded(self.generator.next_hr_question(
                &session.candidate_name,
                &session.job_title,
                &self.transcript,
            ))
            .await
        {
            Ok(question) => question,
            Err(err) => {
                warn!(%err, "hr opener generation failed; using canned opener");
                fallback::hr_opening_question()
            }
        };

        self.transcript.push(HrTurn::interviewer(question.clone()));
        question
    }

    async fn execute(&self, code: &str, language: Language) -> ExecutionOutcome {
        match self.bounded(self.generator.run_code(code, language)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, "code execution call failed");
                fallback::execution_failure()
            }
        }
    }

    async fn fetch_assessment(&self) -> Assessment {
        let session = self.machine.session();
        let request = AssessmentRequest {
            job_title: session.job_title.clone(),
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
            transcript: session
                .rounds
                .hr
                .as_ref()
                .map(|result| result.transcript.clone())
                .unwrap_or_default(),
            proctoring: session.proctoring.clone(),
        };

        match self.bounded(self.generator.assess(&request)).await {
            Ok(assessment) => assessment,
            Err(err) => {
                warn!(%err, "assessment call failed; composing report without it");
                fallback::assessment()
            }
        }
    }

    fn compute_breakdown(&self, assessment: &Assessment) -> ScoreBreakdown {
        let session = self.machine.session();
        let hr_score = assessment.hr_score.unwrap_or(0.0);
        let round_score = |round: RoundTag| -> f64 {
            match round {
                RoundTag::Aptitude => session
                    .rounds
                    .aptitude
                    .as_ref()
                    .map(|result| result.score_percent)
                    .unwrap_or(0.0),
                RoundTag::Coding => session
                    .rounds
                    .coding
                    .as_ref()
                    .map(|result| result.score_percent)
                    .unwrap_or(0.0),
                RoundTag::Hr => hr_score,
            }
        };

        match session.mode {
            InterviewMode::Full => self.calculator.full_interview(
                round_score(RoundTag::Aptitude),
                round_score(RoundTag::Coding),
                hr_score,
                &session.proctoring,
            ),
            InterviewMode::Practice(round) => {
                self.calculator.single_round(round, round_score(round))
            }
        }
    }

    async fn persist(&self, report: &FeedbackReport) {
        let session = self.machine.session();
        let record = SessionRecord {
            session_id: session.id.0.clone(),
            job_title: session.job_title.clone(),
            candidate_name: session.candidate_name.clone(),
            mode: session.mode,
            started_at: session.started_at,
            completed_at: Utc::now(),
            overall_score: report.overall_score,
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
            hr_transcript: session
                .rounds
                .hr
                .as_ref()
                .map(|result| result.transcript.clone())
                .unwrap_or_default(),
            proctoring: session.proctoring.clone(),
            report: report.clone(),
        };

        match timeout(self.settings.collaborator_timeout, self.store.save(record)).await {
            Ok(Ok(stored_id)) => {
                info!(session = %stored_id, "session record persisted");
            }
            Ok(Err(err)) => {
                warn!(%err, "session persistence failed; report still delivered");
            }
            Err(_) => {
                warn!("session persistence timed out; report still delivered");
            }
        }
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, GeneratorError>>,
    ) -> Result<T, GeneratorError> {
        match timeout(self.settings.collaborator_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(GeneratorError::Unavailable(format!(
                "call timed out after {}s",
                self.settings.collaborator_timeout.as_secs()
            ))),
        }
    }

    fn expect_step(
        &self,
        expected: InterviewStep,
        event: &'static str,
    ) -> Result<(), SessionError> {
        if self.machine.step() == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                step: self.machine.step().label(),
                event,
            })
        }
    }
}
