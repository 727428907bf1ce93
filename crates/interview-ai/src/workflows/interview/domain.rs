use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for interview sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// The three assessment stages a candidate can face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundTag {
    Aptitude,
    Coding,
    Hr,
}

impl RoundTag {
    pub const fn label(self) -> &'static str {
        match self {
            RoundTag::Aptitude => "aptitude",
            RoundTag::Coding => "coding",
            RoundTag::Hr => "hr",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            RoundTag::Aptitude => "Aptitude",
            RoundTag::Coding => "Coding",
            RoundTag::Hr => "HR",
        }
    }
}

/// Full interviews walk every round with cutoff gating; practice sessions run
/// a single round and never hard-fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    Full,
    Practice(RoundTag),
}

impl InterviewMode {
    pub const fn is_practice(self) -> bool {
        matches!(self, InterviewMode::Practice(_))
    }

    pub const fn practice_round(self) -> Option<RoundTag> {
        match self {
            InterviewMode::Full => None,
            InterviewMode::Practice(round) => Some(round),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Mathematical,
    Verbal,
    Logical,
}

impl QuestionKind {
    pub const fn label(self) -> &'static str {
        match self {
            QuestionKind::Mathematical => "mathematical",
            QuestionKind::Verbal => "verbal",
            QuestionKind::Logical => "logical",
        }
    }
}

/// A single multiple-choice aptitude question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    /// Generator output contract: exactly four distinct options, with the
    /// canonical answer among them.
    pub fn is_well_formed(&self) -> bool {
        if self.options.len() != 4 {
            return false;
        }
        let mut seen: Vec<&str> = Vec::with_capacity(self.options.len());
        for option in &self.options {
            if seen.contains(&option.as_str()) {
                return false;
            }
            seen.push(option.as_str());
        }
        self.options.contains(&self.correct_answer)
    }

    /// Deterministic presentation order: the option list rotated by `seed`,
    /// so repeated sessions vary without any RNG in the core.
    pub fn presented_options(&self, seed: usize) -> Vec<String> {
        if self.options.is_empty() {
            return Vec::new();
        }
        let pivot = seed % self.options.len();
        let mut rotated = Vec::with_capacity(self.options.len());
        rotated.extend_from_slice(&self.options[pivot..]);
        rotated.extend_from_slice(&self.options[..pivot]);
        rotated
    }
}

/// Completed aptitude round: the questions as asked, the chosen option per
/// question index (None = left blank), and the exact-match percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AptitudeResult {
    pub questions: Vec<Question>,
    pub answers: Vec<Option<String>>,
    pub score_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    JavaScript,
    Java,
    C,
    Cpp,
}

impl Language {
    pub const fn label(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

/// Coding exercise as produced by the generator (or the canned fallback).
///
/// `expected_marker` is the substring a correct submission's output must
/// contain; matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingProblem {
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub example1: String,
    pub example2: String,
    pub starter_code: BTreeMap<Language, String>,
    pub expected_marker: String,
}

/// Result of handing code to the execution collaborator. The collaborator is
/// a text-generation service, not a sandbox; the outcome is taken at face
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Output(String),
    Error(String),
}

/// Completed coding round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingResult {
    pub problem: CodingProblem,
    pub submitted_code: String,
    pub language: Language,
    pub outcome: ExecutionOutcome,
    pub score_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Candidate,
    Interviewer,
}

impl Speaker {
    pub const fn label(self) -> &'static str {
        match self {
            Speaker::Candidate => "Candidate",
            Speaker::Interviewer => "Interviewer",
        }
    }
}

/// One turn of the conversational HR round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl HrTurn {
    pub fn candidate(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
        }
    }

    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
        }
    }
}

/// Ordered transcript of the HR round; scored qualitatively by the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrResult {
    pub transcript: Vec<HrTurn>,
}

/// Accumulated proctoring signals for one session.
///
/// `malpractice_detected` is a monotonic OR over every signal seen so far; it
/// is never cleared within a session, even if a later video analysis reports
/// no issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProctoringState {
    pub tab_switch_count: u32,
    pub video_confidence: f64,
    pub video_engagement: f64,
    pub malpractice_detected: bool,
    pub summary: String,
}

impl Default for ProctoringState {
    fn default() -> Self {
        Self {
            tab_switch_count: 0,
            video_confidence: 0.0,
            video_engagement: 0.0,
            malpractice_detected: false,
            summary: "No issues detected.".to_string(),
        }
    }
}

/// Per-round results recorded so far. Rounds are appended strictly in
/// sequence; a failed session records nothing past the failing round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundResults {
    pub aptitude: Option<AptitudeResult>,
    pub coding: Option<CodingResult>,
    pub hr: Option<HrResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Failed(RoundTag),
    Completed,
}

impl SessionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Failed(_) => "failed",
            SessionStatus::Completed => "completed",
        }
    }
}

/// Final report handed to the candidate and persisted with the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub overall_score: u8,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub narrative_markdown: String,
}

/// Aggregate root for one candidate attempt. Owned exclusively by the state
/// machine for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: SessionId,
    pub job_title: String,
    pub candidate_name: String,
    pub mode: InterviewMode,
    pub started_at: DateTime<Utc>,
    pub rounds: RoundResults,
    pub proctoring: ProctoringState,
    pub status: SessionStatus,
    pub report: Option<FeedbackReport>,
}

impl InterviewSession {
    pub fn new(
        id: SessionId,
        job_title: impl Into<String>,
        candidate_name: impl Into<String>,
        mode: InterviewMode,
    ) -> Self {
        Self {
            id,
            job_title: job_title.into(),
            candidate_name: candidate_name.into(),
            mode,
            started_at: Utc::now(),
            rounds: RoundResults::default(),
            proctoring: ProctoringState::default(),
            status: SessionStatus::InProgress,
            report: None,
        }
    }
}
