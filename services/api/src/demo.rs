use std::sync::Arc;

use clap::Args;

use crate::infra::{CannedGenerator, InMemorySessionStore};
use interview_ai::error::AppError;
use interview_ai::workflows::interview::{
    FlowSettings, InterviewFlow, InterviewMode, Language, MediaPermission, NextStage, RoundEntry,
    RoundTag,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Job title shown on the session and in the report
    #[arg(long, default_value = "Software Engineer")]
    pub(crate) job_title: String,
    /// Candidate name used for the HR conversation
    #[arg(long, default_value = "Candidate")]
    pub(crate) candidate_name: String,
    /// Run a single practice round (aptitude, coding, or hr) instead of a full interview
    #[arg(long, value_parser = parse_round)]
    pub(crate) practice: Option<RoundTag>,
    /// Simulated tab switches recorded during the session
    #[arg(long, default_value_t = 1)]
    pub(crate) tab_switches: u32,
}

fn parse_round(raw: &str) -> Result<RoundTag, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "aptitude" => Ok(RoundTag::Aptitude),
        "coding" => Ok(RoundTag::Coding),
        "hr" => Ok(RoundTag::Hr),
        other => Err(format!(
            "'{other}' is not a round; expected aptitude, coding, or hr"
        )),
    }
}

const DEMO_SOLUTION: &str = "def solve(s):\n    seen = {}\n    for c in s:\n        seen[c] = seen.get(c, 0) + 1\n    for i, c in enumerate(s):\n        if seen[c] == 1:\n            return i\n    return -1\n\nprint(solve(\"interviewace\"))\n";

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mode = match args.practice {
        Some(round) => InterviewMode::Practice(round),
        None => InterviewMode::Full,
    };

    let store = InMemorySessionStore::default();
    let mut flow = InterviewFlow::new(
        args.job_title.clone(),
        args.candidate_name.clone(),
        mode,
        Arc::new(CannedGenerator),
        Arc::new(store.clone()),
        FlowSettings::default(),
    );

    println!("Mock interview demo — {}", args.job_title);
    let entry = flow
        .start(MediaPermission::Granted)
        .await
        .map_err(AppError::from)?;

    for _ in 0..args.tab_switches {
        flow.record_tab_hidden();
    }
    if args.tab_switches > 0 {
        println!(
            "- Simulated {} tab switch(es); malpractice flag latched",
            args.tab_switches
        );
    }

    let mut stage = run_entry(&mut flow, entry).await?;
    loop {
        stage = match stage {
            Some(NextStage::Coding(problem)) => {
                println!("- Coding round: {}", problem.title);
                run_coding(&mut flow).await?
            }
            Some(NextStage::Hr { opening_question }) => {
                println!("- HR round opens: {opening_question}");
                run_hr(&mut flow).await?
            }
            Some(NextStage::Feedback) => break,
            Some(NextStage::Failed) => {
                println!("- Aptitude cutoff missed; session failed and nothing was persisted.");
                return Ok(());
            }
            None => break,
        };
    }

    let report = flow.finalize(None).await.map_err(AppError::from)?;
    println!("\n{}", report.narrative_markdown);

    if let Some(breakdown) = flow.breakdown() {
        println!(
            "(aptitude {:?} | coding {:?} | hr {:?} | penalty {})",
            breakdown.aptitude_percent,
            breakdown.coding_percent,
            breakdown.hr_score,
            breakdown.proctoring_penalty
        );
    }
    println!("Stored records: {}", store.records().len());

    Ok(())
}

async fn run_entry<G, S>(
    flow: &mut InterviewFlow<G, S>,
    entry: RoundEntry,
) -> Result<Option<NextStage>, AppError>
where
    G: interview_ai::workflows::interview::Generator,
    S: interview_ai::workflows::interview::SessionStore,
{
    match entry {
        RoundEntry::Aptitude(plan) => {
            println!(
                "- Aptitude round: {} questions, {}s budget",
                plan.questions.len(),
                plan.time_limit_secs
            );
            let answers = plan
                .questions
                .iter()
                .map(|question| Some(question.correct_answer.clone()))
                .collect();
            let outcome = flow.submit_aptitude(answers).map_err(AppError::from)?;
            println!("  Scored {:.0}%", outcome.score_percent);
            Ok(Some(flow.advance_after_results().await.map_err(AppError::from)?))
        }
        RoundEntry::Coding(problem) => {
            println!("- Coding round: {}", problem.title);
            run_coding(flow).await
        }
        RoundEntry::Hr { opening_question } => {
            println!("- HR round opens: {opening_question}");
            run_hr(flow).await
        }
    }
}

async fn run_coding<G, S>(flow: &mut InterviewFlow<G, S>) -> Result<Option<NextStage>, AppError>
where
    G: interview_ai::workflows::interview::Generator,
    S: interview_ai::workflows::interview::SessionStore,
{
    let run = flow
        .run_code(DEMO_SOLUTION, Language::Python)
        .await
        .map_err(AppError::from)?;
    println!("  Run outcome: {run:?}");

    let advance = flow
        .submit_coding(DEMO_SOLUTION, Language::Python)
        .await
        .map_err(AppError::from)?;
    println!("  Scored {:.0}%", advance.score_percent);
    Ok(Some(advance.next))
}

async fn run_hr<G, S>(flow: &mut InterviewFlow<G, S>) -> Result<Option<NextStage>, AppError>
where
    G: interview_ai::workflows::interview::Generator,
    S: interview_ai::workflows::interview::SessionStore,
{
    let answers = [
        "I have spent five years building backend services and mentoring juniors.",
        "The blend of product ownership and systems work drew me in.",
    ];
    for answer in answers {
        let question = flow.hr_reply(answer).await.map_err(AppError::from)?;
        println!("  Interviewer: {question}");
    }
    flow.finish_hr().map_err(AppError::from)?;
    Ok(Some(NextStage::Feedback))
}
