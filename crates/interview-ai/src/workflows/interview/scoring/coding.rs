use crate::workflows::interview::domain::ExecutionOutcome;

/// Three-tier submission heuristic, documented contract rather than real
/// per-test-case grading:
///
/// - output contains the expected marker (case-insensitive) -> 100
/// - execution reported an error -> 10
/// - output produced but marker absent -> 30
pub fn score_submission(outcome: &ExecutionOutcome, expected_marker: &str) -> f64 {
    match outcome {
        ExecutionOutcome::Output(text) if contains_marker(text, expected_marker) => 100.0,
        ExecutionOutcome::Error(_) => 10.0,
        ExecutionOutcome::Output(_) => 30.0,
    }
}

fn contains_marker(output: &str, marker: &str) -> bool {
    output
        .to_lowercase()
        .contains(marker.to_lowercase().as_str())
}
