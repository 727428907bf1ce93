use std::fmt::Write as _;

use super::domain::{FeedbackReport, InterviewMode, ProctoringState, RoundTag};
use super::generator::Assessment;
use super::scoring::{ScoreBreakdown, ScoringConfig};

/// Deterministic report assembly. The generator contributes only the
/// qualitative strands (strengths, improvements, hr judgment); the score
/// arithmetic and its presentation stay in local code so reports are
/// auditable.
#[derive(Debug, Clone, Default)]
pub struct FeedbackComposer;

impl FeedbackComposer {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(
        &self,
        mode: InterviewMode,
        job_title: &str,
        breakdown: &ScoreBreakdown,
        proctoring: &ProctoringState,
        assessment: &Assessment,
        config: &ScoringConfig,
    ) -> FeedbackReport {
        let mut body = String::new();

        match mode.practice_round() {
            Some(round) => {
                writeln!(body, "# {} Practice Report", round.title()).expect("write title");
            }
            None => {
                writeln!(body, "# Interview Performance Report").expect("write title");
            }
        }
        writeln!(body).expect("write spacer");
        writeln!(body, "**Job title:** {job_title}").expect("write job title");
        writeln!(body, "**Overall score:** {}/100", breakdown.overall).expect("write overall");
        writeln!(body).expect("write spacer");

        if mode == InterviewMode::Full {
            render_breakdown_table(&mut body, breakdown, config);
        }

        render_proctoring(&mut body, proctoring);
        render_list(&mut body, "### Key Strengths", &assessment.strengths);
        render_list(
            &mut body,
            "### Areas for Improvement",
            &assessment.improvements,
        );

        FeedbackReport {
            overall_score: breakdown.overall,
            strengths: assessment.strengths.clone(),
            improvements: assessment.improvements.clone(),
            narrative_markdown: body,
        }
    }
}

fn render_breakdown_table(body: &mut String, breakdown: &ScoreBreakdown, config: &ScoringConfig) {
    writeln!(body, "## Score Breakdown").expect("write heading");
    writeln!(body).expect("write spacer");
    writeln!(body, "| Round | Score | Weight |").expect("write header");
    writeln!(body, "| --- | --- | --- |").expect("write divider");
    writeln!(
        body,
        "| Aptitude | {} | {:.0}% |",
        format_percent(breakdown.aptitude_percent),
        config.aptitude_weight * 100.0
    )
    .expect("write aptitude row");
    writeln!(
        body,
        "| Coding | {} | {:.0}% |",
        format_percent(breakdown.coding_percent),
        config.coding_weight * 100.0
    )
    .expect("write coding row");
    writeln!(
        body,
        "| HR | {} | {:.0}% |",
        format_percent(breakdown.hr_score),
        config.hr_weight * 100.0
    )
    .expect("write hr row");
    writeln!(body).expect("write spacer");
    writeln!(
        body,
        "Proctoring penalty applied: -{:.0}",
        breakdown.proctoring_penalty
    )
    .expect("write penalty");
    writeln!(body).expect("write spacer");
}

fn render_proctoring(body: &mut String, proctoring: &ProctoringState) {
    writeln!(body, "## Proctoring").expect("write heading");
    writeln!(body).expect("write spacer");
    if proctoring.malpractice_detected {
        writeln!(body, "- **Malpractice flagged.** {}", proctoring.summary)
            .expect("write malpractice");
    } else {
        writeln!(body, "- No issues detected.").expect("write clean");
    }
    writeln!(body, "- Tab switches: {}", proctoring.tab_switch_count).expect("write tabs");
    writeln!(
        body,
        "- Confidence: {:.0}% | Engagement: {:.0}%",
        proctoring.video_confidence * 100.0,
        proctoring.video_engagement * 100.0
    )
    .expect("write levels");
    writeln!(body).expect("write spacer");
}

fn render_list(body: &mut String, heading: &str, entries: &[String]) {
    writeln!(body, "{heading}").expect("write heading");
    writeln!(body).expect("write spacer");
    if entries.is_empty() {
        writeln!(body, "_None recorded._").expect("write empty note");
    } else {
        for entry in entries {
            writeln!(body, "- {entry}").expect("write entry");
        }
    }
    writeln!(body).expect("write spacer");
}

fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.0}%"),
        None => "N/A".to_string(),
    }
}

/// Human-facing summary of how a terminal round failure is communicated.
/// Failed sessions carry no report, so this lives beside the composer rather
/// than on [`FeedbackReport`].
pub fn failed_round_notice(round: RoundTag) -> String {
    format!(
        "Unfortunately, you did not meet the cutoff score for the {} round. Use this as a \
         learning opportunity to strengthen your skills for the next attempt.",
        round.title()
    )
}
