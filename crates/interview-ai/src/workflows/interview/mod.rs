//! Interview orchestration core: round sequencing, cutoff gating, weighted
//! scoring, proctoring-signal accumulation, and feedback composition.
//!
//! UI rendering, authentication, and the generative backends live outside
//! this module; the core sees them only as the [`Generator`] and
//! [`SessionStore`] collaborators.

pub mod client;
pub mod domain;
pub mod fallback;
pub mod gate;
pub mod generator;
pub mod machine;
pub mod proctoring;
pub mod report;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use client::HttpGenerator;
pub use domain::{
    AptitudeResult, CodingProblem, CodingResult, Difficulty, ExecutionOutcome, FeedbackReport,
    HrResult, HrTurn, InterviewMode, InterviewSession, Language, ProctoringState, Question,
    QuestionKind, RoundResults, RoundTag, SessionId, SessionStatus, Speaker,
};
pub use gate::RoundGate;
pub use generator::{Assessment, AssessmentRequest, Generator, GeneratorError};
pub use machine::{InterviewStep, MediaPermission, SessionError, SessionStateMachine};
pub use proctoring::{ProctoringTracker, VideoAnalysis};
pub use report::FeedbackComposer;
pub use router::{interview_router, InterviewRegistry, SessionView};
pub use scoring::{ScoreBreakdown, ScoreCalculator, ScoringConfig};
pub use service::{
    AptitudeOutcome, AptitudeRoundPlan, CodingAdvance, FlowSettings, InterviewFlow,
    InterviewFlowError, NextStage, RoundEntry,
};
pub use store::{SessionRecord, SessionStore, StoreError};
