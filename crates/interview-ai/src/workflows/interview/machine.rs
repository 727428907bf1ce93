use super::domain::{
    AptitudeResult, CodingResult, FeedbackReport, HrResult, InterviewMode, InterviewSession,
    RoundTag, SessionStatus,
};
use super::gate::RoundGate;

/// Steps of the interview flow, in canonical order. `Failed` is a side
/// terminal reached only from a gated round in full mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStep {
    Welcome,
    Aptitude,
    AptitudeResults,
    Coding,
    Hr,
    Feedback,
    Failed,
}

impl InterviewStep {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewStep::Welcome => "welcome",
            InterviewStep::Aptitude => "aptitude",
            InterviewStep::AptitudeResults => "aptitude_results",
            InterviewStep::Coding => "coding",
            InterviewStep::Hr => "hr",
            InterviewStep::Feedback => "feedback",
            InterviewStep::Failed => "failed",
        }
    }
}

/// Outcome of the camera/microphone grant that precedes a proctored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaPermission {
    Granted,
    Denied,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("camera and microphone permission denied; the interview cannot start")]
    PermissionDenied,
    #[error("event '{event}' is not valid in the '{step}' step")]
    InvalidTransition {
        step: &'static str,
        event: &'static str,
    },
}

/// Finite-state controller owning the [`InterviewSession`] for its lifetime.
///
/// All transitions are synchronous; asynchronous collaborator calls happen in
/// the surrounding flow, never here. The machine refuses out-of-order events
/// instead of panicking, so duplicate UI submissions surface as
/// [`SessionError::InvalidTransition`].
#[derive(Debug)]
pub struct SessionStateMachine {
    session: InterviewSession,
    step: InterviewStep,
    proctoring_active: bool,
}

impl SessionStateMachine {
    pub fn new(session: InterviewSession) -> Self {
        Self {
            session,
            step: InterviewStep::Welcome,
            proctoring_active: false,
        }
    }

    pub fn step(&self) -> InterviewStep {
        self.step
    }

    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut InterviewSession {
        &mut self.session
    }

    /// Whether the camera/tab-visibility capture should currently be running.
    /// True from a granted `start()` until any terminal step or abandonment.
    pub fn proctoring_active(&self) -> bool {
        self.proctoring_active
    }

    /// Leave `Welcome` once media permission is granted. Full interviews
    /// enter the aptitude round; practice sessions jump to their single
    /// round. Denial keeps the machine in `Welcome`.
    pub fn start(&mut self, permission: MediaPermission) -> Result<InterviewStep, SessionError> {
        self.expect_step(InterviewStep::Welcome, "start")?;
        if permission == MediaPermission::Denied {
            return Err(SessionError::PermissionDenied);
        }

        self.proctoring_active = true;
        self.step = match self.session.mode {
            InterviewMode::Full | InterviewMode::Practice(RoundTag::Aptitude) => {
                InterviewStep::Aptitude
            }
            InterviewMode::Practice(RoundTag::Coding) => InterviewStep::Coding,
            InterviewMode::Practice(RoundTag::Hr) => InterviewStep::Hr,
        };
        Ok(self.step)
    }

    pub fn record_aptitude(
        &mut self,
        result: AptitudeResult,
    ) -> Result<InterviewStep, SessionError> {
        self.expect_step(InterviewStep::Aptitude, "record_aptitude")?;
        self.session.rounds.aptitude = Some(result);
        self.step = InterviewStep::AptitudeResults;
        Ok(self.step)
    }

    /// Apply the gate after the candidate has seen the aptitude outcome.
    /// Practice sessions never hard-fail; full sessions below the cutoff
    /// terminate in `Failed` with nothing scored or persisted.
    pub fn advance_from_results(&mut self, gate: &RoundGate) -> Result<InterviewStep, SessionError> {
        self.expect_step(InterviewStep::AptitudeResults, "advance_from_results")?;
        let score = self
            .session
            .rounds
            .aptitude
            .as_ref()
            .map(|result| result.score_percent)
            .unwrap_or(0.0);

        if self.session.mode.is_practice() {
            return Ok(self.enter_feedback());
        }

        if gate.pass(RoundTag::Aptitude, score) {
            self.step = InterviewStep::Coding;
            Ok(self.step)
        } else {
            self.session.status = SessionStatus::Failed(RoundTag::Aptitude);
            self.proctoring_active = false;
            self.step = InterviewStep::Failed;
            Ok(self.step)
        }
    }

    pub fn record_coding(&mut self, result: CodingResult) -> Result<InterviewStep, SessionError> {
        self.expect_step(InterviewStep::Coding, "record_coding")?;
        self.session.rounds.coding = Some(result);
        self.step = if self.session.mode.is_practice() {
            self.enter_feedback()
        } else {
            InterviewStep::Hr
        };
        Ok(self.step)
    }

    pub fn record_hr(&mut self, result: HrResult) -> Result<InterviewStep, SessionError> {
        self.expect_step(InterviewStep::Hr, "record_hr")?;
        self.session.rounds.hr = Some(result);
        Ok(self.enter_feedback())
    }

    /// Mark the session complete with its composed report. Only valid at
    /// `Feedback`; the surrounding flow guards against double completion.
    pub fn complete(&mut self, report: FeedbackReport) -> Result<(), SessionError> {
        self.expect_step(InterviewStep::Feedback, "complete")?;
        self.session.status = SessionStatus::Completed;
        self.session.report = Some(report);
        Ok(())
    }

    /// Candidate navigated away before `Feedback`: release the capture and
    /// leave the session unscored. Nothing is persisted for abandoned runs.
    pub fn abandon(&mut self) {
        self.proctoring_active = false;
    }

    fn enter_feedback(&mut self) -> InterviewStep {
        self.proctoring_active = false;
        self.step = InterviewStep::Feedback;
        self.step
    }

    fn expect_step(
        &self,
        expected: InterviewStep,
        event: &'static str,
    ) -> Result<(), SessionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                step: self.step.label(),
                event,
            })
        }
    }
}
