use std::time::Duration;

use super::common::*;
use crate::workflows::interview::domain::{
    ExecutionOutcome, InterviewMode, Language, RoundTag, SessionStatus,
};
use crate::workflows::interview::machine::{InterviewStep, MediaPermission, SessionError};
use crate::workflows::interview::proctoring::VideoAnalysis;
use crate::workflows::interview::service::{
    FlowSettings, InterviewFlowError, NextStage, RoundEntry,
};

#[tokio::test]
async fn full_interview_happy_path() {
    let store = RecordingStore::default();
    let mut flow = flow(
        InterviewMode::Full,
        ScriptedGenerator::default(),
        store.clone(),
    );

    let entry = flow.start(MediaPermission::Granted).await.expect("start");
    let plan = match entry {
        RoundEntry::Aptitude(plan) => plan,
        other => panic!("expected aptitude entry, got {other:?}"),
    };
    assert_eq!(plan.questions.len(), 2);
    assert_eq!(plan.time_limit_secs, 600);

    // Some distraction mid-round.
    flow.record_tab_hidden();
    flow.record_tab_hidden();
    flow.record_tab_hidden();

    let outcome = flow
        .submit_aptitude(correct_fallback_answers())
        .expect("submit aptitude");
    assert_eq!(outcome.score_percent, 100.0);
    assert_eq!(flow.step(), InterviewStep::AptitudeResults);

    let stage = flow.advance_after_results().await.expect("advance");
    let problem = match stage {
        NextStage::Coding(problem) => problem,
        other => panic!("expected coding stage, got {other:?}"),
    };
    assert_eq!(problem.expected_marker, "1");

    let run = flow
        .run_code("print(solve(\"interviewace\"))", Language::Python)
        .await
        .expect("run code");
    assert_eq!(run, ExecutionOutcome::Output("1".to_string()));

    let advance = flow
        .submit_coding("print(solve(\"interviewace\"))", Language::Python)
        .await
        .expect("submit coding");
    assert_eq!(advance.score_percent, 100.0);
    let opening = match advance.next {
        NextStage::Hr { opening_question } => opening_question,
        other => panic!("expected hr stage, got {other:?}"),
    };
    assert!(!opening.is_empty());

    let follow_up = flow
        .hr_reply("I have five years of backend experience.")
        .await
        .expect("hr reply");
    assert!(!follow_up.is_empty());

    let step = flow.finish_hr().expect("finish hr");
    assert_eq!(step, InterviewStep::Feedback);

    let report = flow.finalize(None).await.expect("finalize");
    // 100*0.3 + 100*0.3 + 90*0.4 - min(3*2, 20) = 90.
    assert_eq!(report.overall_score, 90);
    assert_eq!(flow.session().status, SessionStatus::Completed);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].overall_score, 90);
    assert_eq!(records[0].aptitude_percent, Some(100.0));
    assert_eq!(records[0].coding_percent, Some(100.0));
    assert_eq!(records[0].proctoring.tab_switch_count, 3);
    assert_eq!(records[0].hr_transcript.len(), 3);
}

#[tokio::test]
async fn finalize_is_idempotent() {
    let store = RecordingStore::default();
    let mut flow = flow(
        InterviewMode::Practice(RoundTag::Hr),
        ScriptedGenerator::default(),
        store.clone(),
    );

    flow.start(MediaPermission::Granted).await.expect("start");
    flow.finish_hr().expect("finish hr");

    let first = flow.finalize(None).await.expect("first finalize");
    let second = flow.finalize(None).await.expect("second finalize");

    assert_eq!(first, second);
    assert_eq!(store.records().len(), 1, "single-flight: one stored record");
}

#[tokio::test]
async fn practice_hr_round_skips_gating_and_penalty() {
    let store = RecordingStore::default();
    let mut flow = flow(
        InterviewMode::Practice(RoundTag::Hr),
        ScriptedGenerator::default(),
        store.clone(),
    );

    let entry = flow.start(MediaPermission::Granted).await.expect("start");
    assert!(matches!(entry, RoundEntry::Hr { .. }));

    // Tab switches accumulate but must not dent a practice score.
    flow.record_tab_hidden();
    flow.record_tab_hidden();

    flow.hr_reply("I enjoy pairing on hard problems.")
        .await
        .expect("hr reply");
    let step = flow.finish_hr().expect("finish hr");
    assert_eq!(step, InterviewStep::Feedback);

    let report = flow.finalize(None).await.expect("finalize");
    assert_eq!(report.overall_score, 90, "overall equals the hr judgment");

    let breakdown = flow.breakdown().expect("breakdown available");
    assert_eq!(breakdown.proctoring_penalty, 0.0);
    assert_eq!(breakdown.aptitude_percent, None);
    assert_eq!(breakdown.coding_percent, None);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].aptitude_percent.is_none());
    assert!(records[0].proctoring.malpractice_detected);
}

#[tokio::test]
async fn failed_aptitude_terminates_without_persistence() {
    let store = RecordingStore::default();
    let mut flow = flow(
        InterviewMode::Full,
        ScriptedGenerator::default(),
        store.clone(),
    );

    flow.start(MediaPermission::Granted).await.expect("start");
    let outcome = flow
        .submit_aptitude(blank_answers(2))
        .expect("submit aptitude");
    assert_eq!(outcome.score_percent, 0.0);

    let stage = flow.advance_after_results().await.expect("advance");
    assert_eq!(stage, NextStage::Failed);
    assert_eq!(
        flow.session().status,
        SessionStatus::Failed(RoundTag::Aptitude)
    );

    // Terminal state: no scoring, no stored record.
    match flow.finalize(None).await {
        Err(InterviewFlowError::Session(SessionError::InvalidTransition { .. })) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn generator_outage_degrades_to_fallbacks_everywhere() {
    let store = RecordingStore::default();
    let mut flow = flow(InterviewMode::Full, FailingGenerator, store.clone());

    let entry = flow.start(MediaPermission::Granted).await.expect("start");
    let plan = match entry {
        RoundEntry::Aptitude(plan) => plan,
        other => panic!("expected aptitude entry, got {other:?}"),
    };
    assert_eq!(plan.questions.len(), 2, "canned question set substituted");

    flow.submit_aptitude(correct_fallback_answers())
        .expect("submit aptitude");
    let stage = flow.advance_after_results().await.expect("advance");
    let problem = match stage {
        NextStage::Coding(problem) => problem,
        other => panic!("expected coding stage, got {other:?}"),
    };
    assert_eq!(problem.title, "Find the First Non-Repeating Character");

    // Execution collaborator down: submission records an error outcome.
    let advance = flow
        .submit_coding("print(1)", Language::Python)
        .await
        .expect("submit coding");
    assert_eq!(advance.score_percent, 10.0);
    let opening = match advance.next {
        NextStage::Hr { opening_question } => opening_question,
        other => panic!("expected hr stage, got {other:?}"),
    };
    assert!(opening.contains("telling me a little bit about yourself"));

    let recovery = flow.hr_reply("An answer.").await.expect("hr reply");
    assert!(recovery.contains("challenging project"));

    flow.finish_hr().expect("finish hr");
    let report = flow.finalize(None).await.expect("finalize");

    // hr judgment missing -> contributes zero: 100*0.3 + 10*0.3 + 0 = 33.
    assert_eq!(report.overall_score, 33);
    assert!(report.strengths.is_empty());
    assert_eq!(store.records().len(), 1, "outage never blocks persistence");
}

#[tokio::test]
async fn malformed_generator_output_is_replaced_not_propagated() {
    let store = RecordingStore::default();
    let mut flow = flow(InterviewMode::Full, MalformedGenerator, store.clone());

    let entry = flow.start(MediaPermission::Granted).await.expect("start");
    let plan = match entry {
        RoundEntry::Aptitude(plan) => plan,
        other => panic!("expected aptitude entry, got {other:?}"),
    };
    assert!(
        plan.questions.iter().all(|question| question.is_well_formed()),
        "malformed batch replaced by the canned set"
    );

    flow.submit_aptitude(correct_fallback_answers())
        .expect("submit aptitude");
    let stage = flow.advance_after_results().await.expect("advance");
    let problem = match stage {
        NextStage::Coding(problem) => problem,
        other => panic!("expected coding stage, got {other:?}"),
    };
    assert_eq!(
        problem.expected_marker, "1",
        "problem without a marker replaced by the canned problem"
    );
}

#[tokio::test]
async fn stalled_generator_hits_the_bounded_wait() {
    let store = RecordingStore::default();
    let settings = FlowSettings {
        collaborator_timeout: Duration::from_millis(20),
        ..FlowSettings::default()
    };
    let mut flow = flow_with_settings(
        InterviewMode::Full,
        StalledGenerator,
        store.clone(),
        settings,
    );

    let entry = flow.start(MediaPermission::Granted).await.expect("start");
    let plan = match entry {
        RoundEntry::Aptitude(plan) => plan,
        other => panic!("expected aptitude entry, got {other:?}"),
    };
    assert_eq!(plan.questions.len(), 2, "timeout degraded to the canned set");
}

#[tokio::test]
async fn video_analysis_merges_at_finalize() {
    let store = RecordingStore::default();
    let mut flow = flow(
        InterviewMode::Practice(RoundTag::Hr),
        ScriptedGenerator::default(),
        store.clone(),
    );

    flow.start(MediaPermission::Granted).await.expect("start");
    flow.record_tab_hidden();
    flow.finish_hr().expect("finish hr");

    let report = flow
        .finalize(Some(VideoAnalysis {
            confidence_level: 0.7,
            engagement_level: 0.8,
            malpractice_detected: false,
            summary: "No issues observed on video.".to_string(),
        }))
        .await
        .expect("finalize");

    // The tab switch already latched the flag; the clean video verdict
    // cannot clear it.
    assert!(flow.session().proctoring.malpractice_detected);
    assert_eq!(flow.session().proctoring.video_confidence, 0.7);
    assert!(report.narrative_markdown.contains("Malpractice flagged"));
}

#[tokio::test]
async fn persistence_failure_still_delivers_the_report() {
    let mut flow = flow(
        InterviewMode::Practice(RoundTag::Hr),
        ScriptedGenerator::default(),
        UnavailableStore,
    );

    flow.start(MediaPermission::Granted).await.expect("start");
    flow.finish_hr().expect("finish hr");

    let report = flow.finalize(None).await.expect("finalize succeeds");
    assert_eq!(report.overall_score, 90);
    assert_eq!(flow.session().status, SessionStatus::Completed);
}

#[tokio::test]
async fn tab_switches_are_ignored_after_abandonment() {
    let store = RecordingStore::default();
    let mut flow = flow(
        InterviewMode::Full,
        ScriptedGenerator::default(),
        store.clone(),
    );

    flow.start(MediaPermission::Granted).await.expect("start");
    flow.record_tab_hidden();
    flow.abandon();
    flow.record_tab_hidden();

    assert_eq!(flow.proctoring().tab_switch_count, 1);
    assert!(store.records().is_empty(), "abandoned sessions are discarded");
}

#[tokio::test]
async fn duplicate_round_submission_is_rejected() {
    let store = RecordingStore::default();
    let mut flow = flow(
        InterviewMode::Full,
        ScriptedGenerator::default(),
        store.clone(),
    );

    flow.start(MediaPermission::Granted).await.expect("start");
    flow.submit_aptitude(correct_fallback_answers())
        .expect("first submission");

    match flow.submit_aptitude(correct_fallback_answers()) {
        Err(InterviewFlowError::Session(SessionError::InvalidTransition { step, event })) => {
            assert_eq!(step, "aptitude_results");
            assert_eq!(event, "submit_aptitude");
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}
